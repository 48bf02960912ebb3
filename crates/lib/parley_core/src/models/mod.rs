//! Domain models.
//!
//! These are internal domain models, distinct from the API wire models
//! (which carry `#[serde(rename)]` for camelCase etc.).

pub mod chart;
pub mod chat;

pub use chart::{ChartKind, ChartPoint, ChartSpec};
pub use chat::{
    Conversation, Message, MessageMetadata, MessageType, NewConversation, NewMessage, NewUser,
    Role, Sentiment, Topic, User,
};
