//! The document database contract.
//!
//! Every admin screen talks to persistence through [`DocumentStore`]:
//! list with equality/range filters and one ordering field, get, create,
//! merge-update, delete, and a per-collection change subscription used by
//! the live chat. Subcollections are plain collection paths such as
//! `chats/{uid}/messages`.

use std::collections::HashMap;

use async_trait::async_trait;
use atelier_core::document::{Document, Fields, ListQuery};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

/// Errors raised by store adapters.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed document {collection}/{id}: {reason}")]
    Malformed {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Generate a new document id (UUID v7, so ids sort by creation time).
pub fn new_document_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

// ---------------------------------------------------------------------------
// Change feed
// ---------------------------------------------------------------------------

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// A single change notification.
#[derive(Debug, Clone, Serialize)]
pub struct StoreChange {
    pub collection: String,
    pub kind: ChangeKind,
    pub id: String,
    /// The document after the change; `None` for removals.
    pub document: Option<Document>,
}

/// Default buffer capacity per collection channel.
const FEED_CAPACITY: usize = 256;

/// Per-collection fan-out of [`StoreChange`]s.
///
/// Channels are created lazily on first subscription and dropped by the
/// first publish that finds no receiver left. Publishing to a collection
/// nobody watches is a no-op. Slow receivers observe `RecvError::Lagged`
/// and skip ahead.
pub struct ChangeFeed {
    channels: RwLock<HashMap<String, broadcast::Sender<StoreChange>>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to changes of one collection path.
    pub async fn subscribe(&self, collection: &str) -> broadcast::Receiver<StoreChange> {
        let mut channels = self.channels.write().await;
        channels
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .subscribe()
    }

    /// Publish a change to the collection's subscribers, if any.
    pub async fn publish(&self, change: StoreChange) {
        let mut channels = self.channels.write().await;
        let collection = change.collection.clone();
        if let Some(tx) = channels.get(&collection) {
            // Err only means every receiver has gone away.
            if tx.send(change).is_err() {
                channels.remove(&collection);
                tracing::debug!(collection = %collection, "Dropped change channel without receivers");
            }
        }
    }

    /// Number of collections with a live channel.
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

/// A schema-less document database.
///
/// Writes are last-write-wins; there are no transactions, no conditional
/// updates and no referential integrity between collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short adapter name for logs and the health endpoint.
    fn backend_name(&self) -> &'static str;

    /// Verify the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Fetch the documents of `collection` matching `query`.
    async fn list(&self, collection: &str, query: &ListQuery) -> Result<Vec<Document>, StoreError>;

    /// Fetch one document by id.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create a document under a generated id.
    async fn create(&self, collection: &str, fields: Fields) -> Result<Document, StoreError>;

    /// Create or replace the body of the document `id`.
    /// `created_at` survives a replace.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<Document, StoreError>;

    /// Merge `fields` into an existing document. Returns `None` if it does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Option<Document>, StoreError>;

    /// Delete a document. Returns `true` if a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// Subscribe to changes of `collection`.
    async fn subscribe(&self, collection: &str) -> broadcast::Receiver<StoreChange>;
}
