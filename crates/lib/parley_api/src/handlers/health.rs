//! Health handler.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::models::HealthResponse;

/// `GET /api/health`: crate version, active provider and conversation count.
pub async fn health_handler(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let conversations = state.chat.storage().list_conversations().await?.len();
    Ok(Json(HealthResponse {
        version: parley_core::version().to_string(),
        provider: state.chat.provider_name().to_string(),
        conversations,
    }))
}
