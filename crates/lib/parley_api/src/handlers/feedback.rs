//! Message feedback handler. Feedback is logged, not stored.

use axum::Json;
use axum::extract::Path;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::models::{FeedbackRequest, FeedbackResponse};

/// `POST /api/messages/{id}/feedback`
pub async fn feedback_handler(
    Path(message_id): Path<Uuid>,
    AppJson(body): AppJson<FeedbackRequest>,
) -> AppResult<Json<FeedbackResponse>> {
    let kind = body.kind.trim();
    if kind.is_empty() {
        return Err(AppError::Validation("Feedback type is required".into()));
    }
    if let Some(rating) = body.rating
        && !(1..=5).contains(&rating)
    {
        return Err(AppError::Validation(
            "Rating must be between 1 and 5".into(),
        ));
    }

    info!(%message_id, kind, rating = ?body.rating, "feedback received");
    Ok(Json(FeedbackResponse {
        success: true,
        message: "Feedback recorded successfully".into(),
    }))
}
