//! # parley_core
//!
//! Core domain logic for Parley: conversation storage, message
//! classification heuristics, generation providers and the chat
//! orchestrator.

pub mod chat;
pub mod classify;
pub mod content;
pub mod intent;
pub mod jobs;
pub mod models;
pub mod prompt;
pub mod provider;
pub mod replies;
pub mod storage;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
