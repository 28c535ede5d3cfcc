//! Live subscription to one chat thread.
//!
//! The socket first receives the thread's ordered snapshot, then one frame
//! per change to its message subcollection. Switching to another user means
//! opening another socket; the subscription ends when this one closes.

use atelier_core::chat::{messages_path, validate_user_id};
use atelier_db::models::chat::ChatMessage;
use atelier_db::models::Record;
use atelier_db::{ChangeKind, Envelope, StoreChange};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use crate::error::AppResult;
use crate::middleware::auth::{authenticate, AuthUser};
use crate::query::TokenParams;
use crate::state::AppState;
use crate::ws::WsOwner;

/// A frame pushed to chat subscribers.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatFrame {
    /// Every message of the thread, oldest first.
    Snapshot(Envelope<Vec<Record<ChatMessage>>>),
    /// One message was added, modified or removed.
    Change {
        kind: ChangeKind,
        id: String,
        message: Option<Record<ChatMessage>>,
    },
}

impl ChatFrame {
    fn to_message(&self) -> Option<Message> {
        match serde_json::to_string(self) {
            Ok(json) => Some(Message::Text(json.into())),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize chat frame");
                None
            }
        }
    }
}

/// Turn a store change into the frame subscribers receive.
pub fn change_frame(path: &str, change: StoreChange) -> ChatFrame {
    let message = change
        .document
        .and_then(|doc| match Record::from_document(path, doc) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path, error = %e, "Skipping malformed chat message");
                None
            }
        });
    ChatFrame::Change {
        kind: change.kind,
        id: change.id,
        message,
    }
}

/// GET /api/v1/admin/chats/{user_id}/subscribe?token=
///
/// Authenticates the `token` query parameter, then upgrades to WebSocket.
pub async fn chat_subscribe(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<TokenParams>,
) -> AppResult<impl IntoResponse> {
    let user = authenticate(&state, &params.token).await?;
    validate_user_id(&user_id)?;
    Ok(ws.on_upgrade(move |socket| handle_chat_socket(socket, state, user, user_id)))
}

async fn send_snapshot(state: &AppState, conn_id: &str, thread_id: &str) {
    let frame = ChatFrame::Snapshot(state.facade.list_messages(thread_id).await.into());
    if let Some(msg) = frame.to_message() {
        state.ws_manager.send(conn_id, msg).await;
    }
}

async fn handle_chat_socket(socket: WebSocket, state: AppState, user: AuthUser, thread_id: String) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let path = messages_path(&thread_id);
    tracing::info!(conn_id = %conn_id, thread = %thread_id, uid = %user.uid, "Chat subscription opened");

    let mut rx = state
        .ws_manager
        .add(
            conn_id.clone(),
            Some(WsOwner {
                uid: user.uid.clone(),
                session_id: user.session_id.clone(),
            }),
            Some(thread_id.clone()),
        )
        .await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() || closing {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Subscribe before the snapshot read so no message falls between the two.
    // A message may then appear in both; clients dedupe by id.
    let mut changes = state.facade.subscribe_messages(&thread_id).await;
    send_snapshot(&state, &conn_id, &thread_id).await;

    loop {
        tokio::select! {
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Pong(_))) => {
                    tracing::trace!(conn_id = %conn_id, "Pong received");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                    break;
                }
            },
            change = changes.recv() => match change {
                Ok(change) => {
                    let delivered = match change_frame(&path, change).to_message() {
                        Some(msg) => state.ws_manager.send(&conn_id, msg).await,
                        None => true,
                    };
                    if !delivered {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(conn_id = %conn_id, skipped, "Chat subscriber lagged; resending snapshot");
                    send_snapshot(&state, &conn_id, &thread_id).await;
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    // Clean up: remove connection and abort sender task.
    state.ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, thread = %thread_id, "Chat subscription closed");
}
