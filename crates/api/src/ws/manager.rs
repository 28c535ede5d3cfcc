use std::collections::HashMap;

use atelier_core::types::Timestamp;
use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// The signed-in admin session a socket was opened under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsOwner {
    pub uid: String,
    pub session_id: String,
}

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Session that opened the socket; closing it closes the socket.
    pub owner: Option<WsOwner>,
    /// Chat thread (user id) the socket is subscribed to.
    pub topic: Option<String>,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    pub connected_at: Timestamp,
}

/// Manages all active WebSocket connections.
///
/// Thread-safe via interior `RwLock`; wrap in `Arc` and share.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(
        &self,
        conn_id: String,
        owner: Option<WsOwner>,
        topic: Option<String>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            owner,
            topic,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID.
    pub async fn remove(&self, conn_id: &str) {
        if let Some(conn) = self.connections.write().await.remove(conn_id) {
            let open_secs = (chrono::Utc::now() - conn.connected_at).num_seconds();
            tracing::debug!(conn_id, open_secs, "WebSocket connection removed");
        }
    }

    /// Queue a message for one connection. Returns `false` if the connection
    /// is gone or its channel closed.
    pub async fn send(&self, conn_id: &str, message: Message) -> bool {
        self.connections
            .read()
            .await
            .get(conn_id)
            .is_some_and(|conn| conn.sender.send(message).is_ok())
    }

    /// Number of sockets subscribed to `topic`.
    pub async fn topic_count(&self, topic: &str) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|conn| conn.topic.as_deref() == Some(topic))
            .count()
    }

    /// Close and forget every connection opened by `uid`.
    ///
    /// Returns the number of connections closed.
    pub async fn close_user(&self, uid: &str) -> usize {
        let count = self.close_where(|owner| owner.uid == uid).await;
        if count > 0 {
            tracing::info!(uid, count, "Closed WebSocket connections of revoked user");
        }
        count
    }

    /// Close and forget every connection opened under `session_id`.
    pub async fn close_session(&self, session_id: &str) -> usize {
        let count = self.close_where(|owner| owner.session_id == session_id).await;
        if count > 0 {
            tracing::info!(session_id, count, "Closed WebSocket connections of ended session");
        }
        count
    }

    async fn close_where(&self, matches: impl Fn(&WsOwner) -> bool) -> usize {
        let mut conns = self.connections.write().await;
        let ids: Vec<String> = conns
            .iter()
            .filter(|(_, conn)| conn.owner.as_ref().is_some_and(&matches))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &ids {
            if let Some(conn) = conns.remove(id) {
                let _ = conn.sender.send(Message::Close(None));
            }
        }
        ids.len()
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
