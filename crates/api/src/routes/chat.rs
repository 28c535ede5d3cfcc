//! Route definitions for the chat inbox.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::chat;
use crate::state::AppState;
use crate::ws;

/// Routes mounted at `/admin/chats`.
///
/// ```text
/// GET  /                         -> list_threads
/// GET  /{user_id}/messages       -> list_messages
/// POST /{user_id}/messages       -> send_message
/// POST /{user_id}/read           -> mark_read
/// GET  /{user_id}/subscribe      -> chat_subscribe (WebSocket)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(chat::list_threads))
        .route(
            "/{user_id}/messages",
            get(chat::list_messages).post(chat::send_message),
        )
        .route("/{user_id}/read", post(chat::mark_read))
        .route("/{user_id}/subscribe", get(ws::chat_subscribe))
}
