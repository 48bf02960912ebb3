//! In-memory storage backed by concurrent maps.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;
use uuid::Uuid;

use super::{Storage, StorageError};
use crate::models::chat::DEFAULT_PERSONA;
use crate::models::{Conversation, Message, NewConversation, NewMessage, NewUser, User};

/// Source of creation timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Users, conversations and messages held in independent maps.
///
/// Each map synchronises its own entries; nothing spans maps, so a reader
/// may observe a deleted conversation whose messages are still present.
/// Usernames are claimed in their own index before the user is stored.
pub struct MemStorage {
    users: DashMap<Uuid, User>,
    usernames: DashMap<String, Uuid>,
    conversations: DashMap<Uuid, Conversation>,
    messages: DashMap<Uuid, Message>,
    clock: Clock,
}

impl MemStorage {
    /// Create an empty store stamping records with the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    /// Create an empty store with a custom timestamp source.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            users: DashMap::new(),
            usernames: DashMap::new(),
            conversations: DashMap::new(),
            messages: DashMap::new(),
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn newest_first(mut conversations: Vec<Conversation>) -> Vec<Conversation> {
        conversations.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        conversations
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemStorage")
            .field("users", &self.users.len())
            .field("conversations", &self.conversations.len())
            .field("messages", &self.messages.len())
            .finish()
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        let id = Uuid::new_v4();
        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => return Err(StorageError::DuplicateUsername(user.username)),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
        let user = User {
            id,
            username: user.username,
            password: user.password,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StorageError> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let Some(id) = self.usernames.get(username).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn create_conversation(
        &self,
        conversation: NewConversation,
    ) -> Result<Conversation, StorageError> {
        let conversation = Conversation {
            id: Uuid::now_v7(),
            title: conversation.title,
            user_id: conversation.user_id,
            persona: conversation
                .persona
                .unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
            created_at: self.now(),
        };
        self.conversations
            .insert(conversation.id, conversation.clone());
        debug!(conversation_id = %conversation.id, "conversation created");
        Ok(conversation)
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>, StorageError> {
        Ok(self.conversations.get(&id).map(|c| c.clone()))
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, StorageError> {
        let all = self.conversations.iter().map(|c| c.clone()).collect();
        Ok(Self::newest_first(all))
    }

    async fn list_user_conversations(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Conversation>, StorageError> {
        let owned = self
            .conversations
            .iter()
            .filter(|c| c.user_id == Some(user_id))
            .map(|c| c.clone())
            .collect();
        Ok(Self::newest_first(owned))
    }

    async fn delete_conversation(&self, id: Uuid) -> Result<bool, StorageError> {
        let existed = self.conversations.remove(&id).is_some();
        let removed = self.delete_conversation_messages(id).await?;
        debug!(conversation_id = %id, existed, removed, "conversation deleted");
        Ok(existed)
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, StorageError> {
        let message = Message {
            id: Uuid::now_v7(),
            conversation_id: message.conversation_id,
            content: message.content,
            role: message.role,
            timestamp: self.now(),
            message_type: message.message_type,
            quick_replies: message.quick_replies,
            sentiment: message.sentiment,
            metadata: message.metadata,
        };
        self.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn get_message(&self, id: Uuid) -> Result<Option<Message>, StorageError> {
        Ok(self.messages.get(&id).map(|m| m.clone()))
    }

    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>, StorageError> {
        let mut messages: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.conversation_id == Some(conversation_id))
            .map(|m| m.clone())
            .collect();
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn delete_conversation_messages(
        &self,
        conversation_id: Uuid,
    ) -> Result<usize, StorageError> {
        let before = self.messages.len();
        self.messages
            .retain(|_, m| m.conversation_id != Some(conversation_id));
        Ok(before.saturating_sub(self.messages.len()))
    }
}
