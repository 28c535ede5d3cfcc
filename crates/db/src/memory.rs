//! In-process [`DocumentStore`] used for local development and tests.
//!
//! Collections are `BTreeMap`s keyed by id. Ids are UUID v7, so the natural
//! iteration order is creation order.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use atelier_core::document::{is_meta_field, Document, Fields, ListQuery};
use chrono::Utc;
use tokio::sync::{broadcast, RwLock};

use crate::store::{new_document_id, ChangeFeed, ChangeKind, DocumentStore, StoreChange, StoreError};

type Collection = BTreeMap<String, Document>;

/// Volatile document store. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn notify(&self, collection: &str, kind: ChangeKind, id: &str, document: Option<Document>) {
        self.feed
            .publish(StoreChange {
                collection: collection.to_string(),
                kind,
                id: id.to_string(),
                document,
            })
            .await;
    }
}

fn strip_meta(mut fields: Fields) -> Fields {
    fields.retain(|key, _| !is_meta_field(key));
    fields
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list(&self, collection: &str, query: &ListQuery) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let docs = collections
            .get(collection)
            .map(|c| c.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(query.apply(docs))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<Document, StoreError> {
        let doc = Document::new(new_document_id(), strip_meta(fields), Utc::now());
        {
            let mut collections = self.collections.write().await;
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(doc.id.clone(), doc.clone());
        }
        self.notify(collection, ChangeKind::Added, &doc.id, Some(doc.clone()))
            .await;
        Ok(doc)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<Document, StoreError> {
        let now = Utc::now();
        let (doc, kind) = {
            let mut collections = self.collections.write().await;
            let entries = collections.entry(collection.to_string()).or_default();
            match entries.get_mut(id) {
                Some(existing) => {
                    existing.fields = strip_meta(fields);
                    existing.updated_at = now;
                    (existing.clone(), ChangeKind::Modified)
                }
                None => {
                    let doc = Document::new(id, strip_meta(fields), now);
                    entries.insert(id.to_string(), doc.clone());
                    (doc, ChangeKind::Added)
                }
            }
        };
        self.notify(collection, kind, id, Some(doc.clone())).await;
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Option<Document>, StoreError> {
        let updated = {
            let mut collections = self.collections.write().await;
            match collections.get_mut(collection).and_then(|c| c.get_mut(id)) {
                Some(doc) => {
                    doc.merge(fields, Utc::now());
                    Some(doc.clone())
                }
                None => None,
            }
        };
        if let Some(doc) = &updated {
            self.notify(collection, ChangeKind::Modified, id, Some(doc.clone()))
                .await;
        }
        Ok(updated)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let removed = {
            let mut collections = self.collections.write().await;
            collections
                .get_mut(collection)
                .and_then(|c| c.remove(id))
                .is_some()
        };
        if removed {
            self.notify(collection, ChangeKind::Removed, id, None).await;
        }
        Ok(removed)
    }

    async fn subscribe(&self, collection: &str) -> broadcast::Receiver<StoreChange> {
        self.feed.subscribe(collection).await
    }
}
