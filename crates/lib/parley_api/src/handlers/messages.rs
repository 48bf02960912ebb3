//! Message request handlers.

use axum::Json;
use axum::extract::{Path, State};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parley_core::chat::{Attachment, SendMessage};
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::models::{AttachmentPayload, MessageResponse, SendMessageRequest, SendMessageResponse};

/// `GET /api/conversations/{id}/messages`: oldest first; empty for unknown ids.
pub async fn list_messages_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<MessageResponse>>> {
    let messages = state.chat.storage().list_messages(id).await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

/// `POST /api/conversations/{id}/messages`: store the message and reply.
pub async fn send_message_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(body): AppJson<SendMessageRequest>,
) -> AppResult<Json<SendMessageResponse>> {
    let attachments = body
        .attachments
        .into_iter()
        .map(decode_attachment)
        .collect::<AppResult<Vec<_>>>()?;

    let exchange = state
        .chat
        .send_message(
            id,
            SendMessage {
                content: body.content,
                attachments,
            },
        )
        .await?;

    Ok(Json(SendMessageResponse {
        user_message: exchange.user_message.into(),
        bot_message: exchange.bot_message.into(),
        jobs: exchange.jobs.into_iter().map(Into::into).collect(),
    }))
}

fn decode_attachment(payload: AttachmentPayload) -> AppResult<Attachment> {
    let data = STANDARD.decode(payload.data.trim()).map_err(|e| {
        AppError::Validation(format!("Invalid base64 in {}: {e}", payload.file_name))
    })?;
    Ok(Attachment {
        file_name: payload.file_name,
        mime_type: payload.mime_type,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_attachment_payload() {
        let attachment = decode_attachment(AttachmentPayload {
            file_name: "notes.txt".into(),
            mime_type: "text/plain".into(),
            data: STANDARD.encode("hello"),
        })
        .unwrap();
        assert_eq!(attachment.data, b"hello");
        assert_eq!(attachment.file_name, "notes.txt");
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = decode_attachment(AttachmentPayload {
            file_name: "x.png".into(),
            mime_type: "image/png".into(),
            data: "not base64!!".into(),
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.contains("x.png")));
    }
}
