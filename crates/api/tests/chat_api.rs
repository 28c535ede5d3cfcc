//! Integration tests for the chat inbox endpoints.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use atelier_core::chat::THREADS_COLLECTION;
use atelier_core::document::{Document, Fields, ListQuery};
use atelier_db::{DocumentStore, MemoryStore, StoreChange, StoreError};
use axum::http::StatusCode;
use common::{
    admin_token, body_json, build_test_app, build_test_app_with_store, get_auth, post_auth,
    post_json_auth,
};
use serde_json::json;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Delegates to a [`MemoryStore`] but refuses writes to thread summaries.
struct SummaryOutage {
    inner: MemoryStore,
}

fn outage() -> StoreError {
    StoreError::Io(std::io::Error::other("thread summaries unavailable"))
}

#[async_trait]
impl DocumentStore for SummaryOutage {
    fn backend_name(&self) -> &'static str {
        "summary-outage"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list(&self, collection: &str, query: &ListQuery) -> Result<Vec<Document>, StoreError> {
        self.inner.list(collection, query).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<Document, StoreError> {
        self.inner.create(collection, fields).await
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<Document, StoreError> {
        if collection == THREADS_COLLECTION {
            return Err(outage());
        }
        self.inner.set(collection, id, fields).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Option<Document>, StoreError> {
        if collection == THREADS_COLLECTION {
            return Err(outage());
        }
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        self.inner.delete(collection, id).await
    }

    async fn subscribe(&self, collection: &str) -> broadcast::Receiver<StoreChange> {
        self.inner.subscribe(collection).await
    }
}

// ---------------------------------------------------------------------------
// Sending
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sending_appends_and_updates_the_summary() {
    let test = build_test_app();
    let token = admin_token(&test, "ada@example.com", "admin").await;

    let response = post_json_auth(
        test.app(),
        "/api/v1/admin/chats/user-1/messages",
        json!({ "text": "  Hello there  " }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["summary_updated"], true);
    assert_eq!(json["data"]["message"]["text"], "Hello there");
    assert_eq!(json["data"]["message"]["sender"], "admin");
    assert_eq!(json["data"]["message"]["sender_name"], "ada");

    let response = get_auth(test.app(), "/api/v1/admin/chats/user-1/messages", &token).await;
    let messages = body_json(response).await["data"].as_array().unwrap().clone();
    assert_eq!(messages.len(), 1);

    let response = get_auth(test.app(), "/api/v1/admin/chats", &token).await;
    let threads = body_json(response).await["data"].as_array().unwrap().clone();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0]["id"], "user-1");
    assert_eq!(threads[0]["last_message"], "Hello there");
    assert_eq!(threads[0]["last_sender"], "admin");
}

#[tokio::test]
async fn messages_are_listed_in_send_order() {
    let test = build_test_app();
    let token = admin_token(&test, "ada@example.com", "admin").await;

    for text in ["one", "two", "three"] {
        let response = post_json_auth(
            test.app(),
            "/api/v1/admin/chats/user-1/messages",
            json!({ "text": text }),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = get_auth(test.app(), "/api/v1/admin/chats/user-1/messages", &token).await;
    let texts: Vec<String> = body_json(response).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn blank_messages_are_rejected() {
    let test = build_test_app();
    let token = admin_token(&test, "ada@example.com", "admin").await;

    let response = post_json_auth(
        test.app(),
        "/api/v1/admin/chats/user-1/messages",
        json!({ "text": "   " }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = get_auth(test.app(), "/api/v1/admin/chats/user-1/messages", &token).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn a_failed_summary_does_not_undo_the_message() {
    let test = build_test_app_with_store(Arc::new(SummaryOutage {
        inner: MemoryStore::new(),
    }));
    let token = admin_token(&test, "ada@example.com", "admin").await;

    let response = post_json_auth(
        test.app(),
        "/api/v1/admin/chats/user-1/messages",
        json!({ "text": "Still delivered" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["summary_updated"], false);

    let response = get_auth(test.app(), "/api/v1/admin/chats/user-1/messages", &token).await;
    let messages = body_json(response).await["data"].as_array().unwrap().clone();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], "Still delivered");
}

// ---------------------------------------------------------------------------
// Read state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn marking_an_unknown_thread_read_is_not_found() {
    let test = build_test_app();
    let token = admin_token(&test, "ada@example.com", "admin").await;

    let response = post_auth(test.app(), "/api/v1/admin/chats/user-1/read", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn marking_read_resets_the_unread_counter() {
    let test = build_test_app();
    let token = admin_token(&test, "ada@example.com", "admin").await;

    // A user-side write the console only ever observes.
    let mut thread = Fields::new();
    thread.insert("user_name".into(), json!("Grace"));
    thread.insert("last_sender".into(), json!("user"));
    thread.insert("unread_count".into(), json!(3));
    test.state
        .facade
        .store()
        .set(THREADS_COLLECTION, "user-1", thread)
        .await
        .unwrap();

    let response = post_auth(test.app(), "/api/v1/admin/chats/user-1/read", &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let stored = test.state.facade.get_thread("user-1").await.unwrap().unwrap();
    assert_eq!(stored.data.unread_count, 0);
    assert_eq!(stored.data.user_name.as_deref(), Some("Grace"));
}

#[tokio::test]
async fn chat_routes_require_an_admin() {
    let test = build_test_app();
    let response = common::get(test.app(), "/api/v1/admin/chats").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
