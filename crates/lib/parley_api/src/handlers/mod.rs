//! Request handlers.

pub mod conversations;
pub mod feedback;
pub mod health;
pub mod jobs;
pub mod messages;
pub mod users;
