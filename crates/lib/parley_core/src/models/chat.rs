//! Users, conversations and messages.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persona assigned to conversations created without one.
pub const DEFAULT_PERSONA: &str = "friendly";

// =============================================================================
// Enums
// =============================================================================

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a message's content holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    Chart,
    System,
}

/// Coarse emotional label of a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Confused,
    Frustrated,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Confused => "confused",
            Sentiment::Frustrated => "frustrated",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic category of a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    Technical,
    Creative,
    Educational,
    Research,
    ProblemSolving,
    General,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Technical => "technical",
            Topic::Creative => "creative",
            Topic::Educational => "educational",
            Topic::Research => "research",
            Topic::ProblemSolving => "problem-solving",
            Topic::General => "general",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Records
// =============================================================================

/// Stub-auth user. The password is stored as given and never returned by
/// the API.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password: String,
}

/// Input for [`crate::storage::Storage::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

/// A titled container for an ordered sequence of messages.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub user_id: Option<Uuid>,
    pub persona: String,
    pub created_at: DateTime<Utc>,
}

/// Input for [`crate::storage::Storage::create_conversation`].
#[derive(Debug, Clone, Default)]
pub struct NewConversation {
    pub title: String,
    pub user_id: Option<Uuid>,
    pub persona: Option<String>,
}

impl NewConversation {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Extra facts recorded on assistant replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    pub has_visuals: bool,
    pub is_search_response: bool,
    pub user_sentiment: Sentiment,
    pub topic: Topic,
}

/// One turn in a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Option<Uuid>,
    pub content: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
    pub message_type: MessageType,
    pub quick_replies: Option<Vec<String>>,
    pub sentiment: Option<Sentiment>,
    pub metadata: Option<MessageMetadata>,
}

/// Input for [`crate::storage::Storage::create_message`].
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: Option<Uuid>,
    pub content: String,
    pub role: Role,
    pub message_type: MessageType,
    pub quick_replies: Option<Vec<String>>,
    pub sentiment: Option<Sentiment>,
    pub metadata: Option<MessageMetadata>,
}

impl NewMessage {
    fn new(conversation_id: Uuid, role: Role, content: impl Into<String>) -> Self {
        Self {
            conversation_id: Some(conversation_id),
            content: content.into(),
            role,
            message_type: MessageType::Text,
            quick_replies: None,
            sentiment: None,
            metadata: None,
        }
    }

    pub fn user(conversation_id: Uuid, content: impl Into<String>) -> Self {
        Self::new(conversation_id, Role::User, content)
    }

    pub fn assistant(conversation_id: Uuid, content: impl Into<String>) -> Self {
        Self::new(conversation_id, Role::Assistant, content)
    }

    pub fn with_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    /// Attach quick replies; an empty list is stored as `None`.
    pub fn with_quick_replies(mut self, replies: Vec<String>) -> Self {
        self.quick_replies = (!replies.is_empty()).then_some(replies);
        self
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
