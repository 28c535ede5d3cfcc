//! Handlers for the admin chat inbox.

use atelier_core::chat::{validate_message_text, validate_user_id, SENDER_ADMIN};
use atelier_core::error::CoreError;
use atelier_db::models::chat::ChatMessage;
use atelier_db::models::Record;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/chats/{user_id}/messages`.
#[derive(Debug, Deserialize)]
pub struct SendMessageInput {
    pub text: String,
}

/// Result of sending a message.
///
/// `summary_updated` is `false` when the message was stored but the thread
/// summary could not be refreshed; the message still stands.
#[derive(Debug, Serialize)]
pub struct SentMessage {
    pub message: Record<ChatMessage>,
    pub summary_updated: bool,
}

/// GET /api/v1/admin/chats
///
/// Threads ordered by most recent activity.
pub async fn list_threads(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let threads = state.facade.list_threads().await?;
    Ok(Json(DataResponse { data: threads }))
}

/// GET /api/v1/admin/chats/{user_id}/messages
///
/// Messages in send order.
pub async fn list_messages(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    validate_user_id(&user_id)?;
    let messages = state.facade.list_messages(&user_id).await?;
    Ok(Json(DataResponse { data: messages }))
}

/// POST /api/v1/admin/chats/{user_id}/messages
///
/// Appends the message, then refreshes the thread summary. The two writes
/// are not atomic.
pub async fn send_message(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(input): Json<SendMessageInput>,
) -> AppResult<impl IntoResponse> {
    validate_user_id(&user_id)?;
    let text = validate_message_text(&input.text)?;

    let message = state
        .facade
        .append_message(
            &user_id,
            &ChatMessage {
                text,
                sender: SENDER_ADMIN.into(),
                sender_name: Some(admin.admin_name.clone()),
            },
        )
        .await?;

    let summary_updated = match state.facade.update_thread_summary(&user_id, &message).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(
                thread = %user_id,
                message_id = %message.id,
                error = %e,
                "Message stored but thread summary update failed"
            );
            false
        }
    };

    tracing::info!(
        thread = %user_id,
        message_id = %message.id,
        uid = %admin.uid,
        "Chat message sent"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SentMessage {
                message,
                summary_updated,
            },
        }),
    ))
}

/// POST /api/v1/admin/chats/{user_id}/read
///
/// Reset the thread's unread counter. 404 if the thread does not exist.
pub async fn mark_read(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<StatusCode> {
    validate_user_id(&user_id)?;
    if !state.facade.mark_thread_read(&user_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Chat thread",
            id: user_id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}
