//! Conversation request handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use parley_core::models::NewConversation;
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::models::{ConversationResponse, CreateConversationRequest, SuccessResponse};

/// `GET /api/conversations`: all conversations, newest first.
pub async fn list_conversations_handler(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ConversationResponse>>> {
    let conversations = state.chat.storage().list_conversations().await?;
    Ok(Json(conversations.into_iter().map(Into::into).collect()))
}

/// `POST /api/conversations`
pub async fn create_conversation_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateConversationRequest>,
) -> AppResult<(StatusCode, Json<ConversationResponse>)> {
    let title = body.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }
    let persona = body
        .persona
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let conversation = state
        .chat
        .storage()
        .create_conversation(NewConversation {
            title: title.to_string(),
            user_id: body.user_id,
            persona,
        })
        .await?;
    info!(conversation_id = %conversation.id, "conversation created");
    Ok((StatusCode::CREATED, Json(conversation.into())))
}

/// `GET /api/conversations/{id}`
pub async fn get_conversation_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ConversationResponse>> {
    state
        .chat
        .storage()
        .get_conversation(id)
        .await?
        .map(|c| Json(c.into()))
        .ok_or_else(|| AppError::NotFound(format!("Conversation {id} not found")))
}

/// `DELETE /api/conversations/{id}`: removes the conversation, its messages and jobs.
pub async fn delete_conversation_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    if !state.chat.delete_conversation(id).await? {
        return Err(AppError::NotFound(format!("Conversation {id} not found")));
    }
    Ok(Json(SuccessResponse { success: true }))
}
