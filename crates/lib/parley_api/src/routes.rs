//! Route paths.

/// GET /api/health: liveness and provider info
pub const GET_API_HEALTH: &str = "/api/health";
/// POST /api/users: register a stub-auth user
pub const POST_API_USERS: &str = "/api/users";
/// GET /api/users/{id}/conversations: conversations owned by a user
pub const GET_API_USERS_ID_CONVERSATIONS: &str = "/api/users/{id}/conversations";
/// GET /api/conversations: all conversations, newest first
pub const GET_API_CONVERSATIONS: &str = "/api/conversations";
/// POST /api/conversations: create a conversation
pub const POST_API_CONVERSATIONS: &str = "/api/conversations";
/// GET /api/conversations/{id}
pub const GET_API_CONVERSATIONS_ID: &str = "/api/conversations/{id}";
/// DELETE /api/conversations/{id}: delete a conversation and its messages
pub const DELETE_API_CONVERSATIONS_ID: &str = "/api/conversations/{id}";
/// GET /api/conversations/{id}/messages: messages, oldest first
pub const GET_API_CONVERSATIONS_ID_MESSAGES: &str = "/api/conversations/{id}/messages";
/// POST /api/conversations/{id}/messages: send a message, get the reply
pub const POST_API_CONVERSATIONS_ID_MESSAGES: &str = "/api/conversations/{id}/messages";
/// GET /api/conversations/{id}/jobs: follow-up jobs of a conversation
pub const GET_API_CONVERSATIONS_ID_JOBS: &str = "/api/conversations/{id}/jobs";
/// GET /api/conversations/{id}/events: server-sent job updates
pub const GET_API_CONVERSATIONS_ID_EVENTS: &str = "/api/conversations/{id}/events";
/// GET /api/jobs/{id}
pub const GET_API_JOBS_ID: &str = "/api/jobs/{id}";
/// POST /api/messages/{id}/feedback: rate a message
pub const POST_API_MESSAGES_ID_FEEDBACK: &str = "/api/messages/{id}/feedback";
