//! User request handlers (stub auth: no login, no password hashing).

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use parley_core::models::NewUser;
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::models::{ConversationResponse, CreateUserRequest, UserResponse};

/// `POST /api/users`: register a user.
pub async fn create_user_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let username = body.username.trim();
    if username.is_empty() || body.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".into(),
        ));
    }

    let user = state
        .chat
        .storage()
        .create_user(NewUser {
            username: username.to_string(),
            password: body.password,
        })
        .await?;
    info!(user_id = %user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// `GET /api/users/{id}/conversations`
pub async fn list_user_conversations_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<ConversationResponse>>> {
    let conversations = state.chat.storage().list_user_conversations(id).await?;
    Ok(Json(conversations.into_iter().map(Into::into).collect()))
}
