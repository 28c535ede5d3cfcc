//! Request façade: one call per (collection, operation) pair.
//!
//! Every method is exactly one round trip to the [`DocumentStore`] except
//! where noted, and returns `Result<T, StoreError>`. The HTTP layer turns the
//! result into its response envelope; other callers can use [`Envelope`].

use std::fmt::Display;
use std::sync::Arc;

use atelier_core::chat::{messages_path, preview, THREADS_COLLECTION};
use atelier_core::document::{format_timestamp, Document, Fields, Filter, ListQuery, OrderBy};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::models::chat::{ChatMessage, ChatThread};
use crate::models::{to_fields, Entity, Record};
use crate::store::{DocumentStore, StoreChange, StoreError};

/// `{ data }` on success, `{ error }` on failure.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for Envelope<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}

/// Typed access to the admin collections.
#[derive(Clone)]
pub struct Facade {
    store: Arc<dyn DocumentStore>,
}

impl Facade {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The underlying store, for callers that need raw collection access.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Entity collections
    // -----------------------------------------------------------------------

    /// Every document of `E`'s collection, newest first.
    pub async fn list_documents<E: Entity>(&self) -> Result<Vec<Document>, StoreError> {
        let query = ListQuery::new().order_by(OrderBy::desc("created_at"));
        self.store.list(E::SCHEMA.collection, &query).await
    }

    pub async fn get_document<E: Entity>(&self, id: &str) -> Result<Option<Document>, StoreError> {
        self.store.get(E::SCHEMA.collection, id).await
    }

    pub async fn get<E: Entity>(&self, id: &str) -> Result<Option<Record<E>>, StoreError> {
        self.get_document::<E>(id)
            .await?
            .map(|doc| Record::from_document(E::SCHEMA.collection, doc))
            .transpose()
    }

    /// First record whose `field` equals `value`.
    pub async fn find_by<E: Entity>(
        &self,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Record<E>>, StoreError> {
        let query = ListQuery::new().filter(Filter::eq(field, value)).limit(1);
        let docs = self.store.list(E::SCHEMA.collection, &query).await?;
        docs.into_iter()
            .next()
            .map(|doc| Record::from_document(E::SCHEMA.collection, doc))
            .transpose()
    }

    pub async fn create<E: Entity>(&self, body: &E) -> Result<Record<E>, StoreError> {
        let doc = self
            .store
            .create(E::SCHEMA.collection, to_fields(body)?)
            .await?;
        Record::from_document(E::SCHEMA.collection, doc)
    }

    /// Merge `body` into the stored document. Fields the body does not model
    /// are left untouched.
    pub async fn update<E: Entity>(
        &self,
        id: &str,
        body: &E,
    ) -> Result<Option<Record<E>>, StoreError> {
        self.store
            .update(E::SCHEMA.collection, id, to_fields(body)?)
            .await?
            .map(|doc| Record::from_document(E::SCHEMA.collection, doc))
            .transpose()
    }

    /// Delete a record, returning what was removed. Two round trips: the
    /// record is read first so its owned objects can be cleaned up.
    pub async fn delete<E: Entity>(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let Some(doc) = self.get_document::<E>(id).await? else {
            return Ok(None);
        };
        if self.store.delete(E::SCHEMA.collection, id).await? {
            Ok(Some(doc))
        } else {
            Ok(None)
        }
    }

    /// Number of documents in a raw collection.
    pub async fn count(&self, collection: &str) -> Result<usize, StoreError> {
        Ok(self.store.list(collection, &ListQuery::new()).await?.len())
    }

    // -----------------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------------

    /// All threads, most recent activity first.
    pub async fn list_threads(&self) -> Result<Vec<Record<ChatThread>>, StoreError> {
        let query = ListQuery::new().order_by(OrderBy::desc("last_message_at"));
        self.store
            .list(THREADS_COLLECTION, &query)
            .await?
            .into_iter()
            .map(|doc| Record::from_document(THREADS_COLLECTION, doc))
            .collect()
    }

    pub async fn get_thread(&self, user_id: &str) -> Result<Option<Record<ChatThread>>, StoreError> {
        self.store
            .get(THREADS_COLLECTION, user_id)
            .await?
            .map(|doc| Record::from_document(THREADS_COLLECTION, doc))
            .transpose()
    }

    /// A thread's messages in send order.
    pub async fn list_messages(
        &self,
        user_id: &str,
    ) -> Result<Vec<Record<ChatMessage>>, StoreError> {
        let path = messages_path(user_id);
        let query = ListQuery::new().order_by(OrderBy::asc("created_at"));
        self.store
            .list(&path, &query)
            .await?
            .into_iter()
            .map(|doc| Record::from_document(&path, doc))
            .collect()
    }

    pub async fn append_message(
        &self,
        user_id: &str,
        message: &ChatMessage,
    ) -> Result<Record<ChatMessage>, StoreError> {
        let path = messages_path(user_id);
        let doc = self.store.create(&path, to_fields(message)?).await?;
        Record::from_document(&path, doc)
    }

    /// Refresh the thread's denormalised `last_message*` fields from `message`.
    /// Creates the thread document if the user has none yet.
    pub async fn update_thread_summary(
        &self,
        user_id: &str,
        message: &Record<ChatMessage>,
    ) -> Result<Record<ChatThread>, StoreError> {
        let mut summary = Fields::new();
        summary.insert("last_message".into(), preview(&message.data.text).into());
        summary.insert(
            "last_message_at".into(),
            format_timestamp(&message.created_at).into(),
        );
        summary.insert("last_sender".into(), message.data.sender.clone().into());

        let doc = match self
            .store
            .update(THREADS_COLLECTION, user_id, summary.clone())
            .await?
        {
            Some(doc) => doc,
            None => self.store.set(THREADS_COLLECTION, user_id, summary).await?,
        };
        Record::from_document(THREADS_COLLECTION, doc)
    }

    /// Reset a thread's unread counter after an admin has viewed it.
    pub async fn mark_thread_read(&self, user_id: &str) -> Result<bool, StoreError> {
        let mut fields = Fields::new();
        fields.insert("unread_count".into(), 0.into());
        fields.insert(
            "read_at".into(),
            format_timestamp(&Utc::now()).into(),
        );
        Ok(self
            .store
            .update(THREADS_COLLECTION, user_id, fields)
            .await?
            .is_some())
    }

    /// Live changes to a thread's message subcollection.
    pub async fn subscribe_messages(&self, user_id: &str) -> broadcast::Receiver<StoreChange> {
        self.store.subscribe(&messages_path(user_id)).await
    }
}
