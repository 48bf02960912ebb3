//! API request and response bodies (camelCase on the wire).

use parley_core::jobs::{Job, JobKind, JobStatus};
use parley_core::models::{
    Conversation, Message, MessageMetadata, MessageType, Role, Sentiment, User,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error body returned for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub version: String,
    pub provider: String,
    pub conversations: usize,
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// A user, without the password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

// =============================================================================
// Conversations
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub title: String,
    pub user_id: Option<Uuid>,
    pub persona: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: Uuid,
    pub title: String,
    pub user_id: Option<Uuid>,
    pub persona: String,
    pub created_at: String,
}

impl From<Conversation> for ConversationResponse {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            title: c.title,
            user_id: c.user_id,
            persona: c.persona,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

// =============================================================================
// Messages
// =============================================================================

/// A file attached to a message, base64-encoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPayload {
    pub file_name: String,
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: Option<Uuid>,
    pub content: String,
    pub role: Role,
    pub timestamp: String,
    pub message_type: MessageType,
    pub quick_replies: Option<Vec<String>>,
    pub sentiment: Option<Sentiment>,
    pub metadata: Option<MessageMetadata>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            content: m.content,
            role: m.role,
            timestamp: m.timestamp.to_rfc3339(),
            message_type: m.message_type,
            quick_replies: m.quick_replies,
            sentiment: m.sentiment,
            metadata: m.metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub user_message: MessageResponse,
    pub bot_message: MessageResponse,
    pub jobs: Vec<JobResponse>,
}

// =============================================================================
// Jobs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    pub message_id: Option<Uuid>,
    pub error: Option<String>,
    pub fallback: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Job> for JobResponse {
    fn from(j: Job) -> Self {
        Self {
            id: j.id,
            conversation_id: j.conversation_id,
            kind: j.kind,
            status: j.status,
            message_id: j.message_id,
            error: j.error,
            fallback: j.fallback,
            created_at: j.created_at.to_rfc3339(),
            updated_at: j.updated_at.to_rfc3339(),
        }
    }
}

/// Query parameters for `GET /api/jobs/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobQuery {
    /// Long-poll: hold the request until the job finishes (bounded).
    #[serde(default)]
    pub wait: bool,
}

// =============================================================================
// Feedback
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub rating: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub message: String,
}
