//! Conversation and message persistence.
//!
//! Handlers and the chat orchestrator only see the [`Storage`] trait, so the
//! in-memory [`MemStorage`] can be swapped for a database-backed
//! implementation without touching them.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Conversation, Message, NewConversation, NewMessage, NewUser, User};

pub use memory::MemStorage;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Username already taken: {0}")]
    DuplicateUsername(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Repository over users, conversations and messages.
///
/// No transactional guarantees: multi-step operations (such as the cascade
/// in [`Storage::delete_conversation`]) are not atomic.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StorageError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;

    async fn create_conversation(
        &self,
        conversation: NewConversation,
    ) -> Result<Conversation, StorageError>;

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>, StorageError>;

    /// All conversations, newest first.
    async fn list_conversations(&self) -> Result<Vec<Conversation>, StorageError>;

    /// Conversations owned by `user_id`, newest first.
    async fn list_user_conversations(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Conversation>, StorageError>;

    /// Delete a conversation and then its messages.
    ///
    /// Returns `false` if the conversation did not exist.
    async fn delete_conversation(&self, id: Uuid) -> Result<bool, StorageError>;

    async fn create_message(&self, message: NewMessage) -> Result<Message, StorageError>;

    async fn get_message(&self, id: Uuid) -> Result<Option<Message>, StorageError>;

    /// Messages of a conversation, oldest first.
    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>, StorageError>;

    /// Remove every message of a conversation, returning how many were removed.
    async fn delete_conversation_messages(
        &self,
        conversation_id: Uuid,
    ) -> Result<usize, StorageError>;
}
