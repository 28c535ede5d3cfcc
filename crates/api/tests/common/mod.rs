#![allow(dead_code)]

use std::sync::Arc;

use atelier_api::auth::identity::{IdentityProvider, LocalIdentityProvider};
use atelier_api::auth::jwt::JwtConfig;
use atelier_api::config::{LogFormat, ServerConfig, StoreBackend};
use atelier_api::router::build_app_router;
use atelier_api::state::AppState;
use atelier_db::models::admin::Admin;
use atelier_db::models::Record;
use atelier_db::{DocumentStore, LocalObjectStore, MemoryStore, ObjectStore};
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse-42";

/// Upload limit used by the test configuration.
pub const TEST_MAX_UPLOAD_BYTES: u64 = 64 * 1024;

/// A router over a fresh in-memory store, plus handles on its state.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    /// Keeps the upload directory alive for the duration of the test.
    pub uploads: TempDir,
    cancel: CancellationToken,
}

impl TestApp {
    /// A clone of the router for one `oneshot` call.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(upload_dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        store_backend: StoreBackend::Memory,
        database_url: None,
        upload_dir: upload_dir.to_path_buf(),
        upload_public_url: "/uploads".to_string(),
        max_upload_bytes: TEST_MAX_UPLOAD_BYTES,
        dashboard_refresh_secs: 30,
        session_sweep_secs: 60,
        bootstrap_admin: None,
        log_format: LogFormat::Pretty,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            expiry_mins: 60,
        },
    }
}

/// Build the full application over a fresh [`MemoryStore`].
pub fn build_test_app() -> TestApp {
    build_test_app_with_store(Arc::new(MemoryStore::new()))
}

/// Build the full application over `store`, with the session sync task
/// running as it does in production.
pub fn build_test_app_with_store(store: Arc<dyn DocumentStore>) -> TestApp {
    let uploads = tempfile::tempdir().expect("temp upload dir");
    let config = test_config(uploads.path());

    let objects: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(
        uploads.path(),
        config.upload_public_url.clone(),
    ));
    let identity: Arc<dyn IdentityProvider> = Arc::new(LocalIdentityProvider::new(
        Arc::clone(&store),
        config.jwt.clone(),
    ));
    let state = AppState::new(store, objects, identity, config.clone());

    let cancel = CancellationToken::new();
    Arc::clone(&state.sessions).start_sync(
        state.identity.on_session_changed(),
        Arc::clone(&state.ws_manager),
        cancel.clone(),
    );

    let router = build_app_router(state.clone(), &config);
    TestApp {
        router,
        state,
        uploads,
        cancel,
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Register an identity with [`PASSWORD`] and grant it `role`.
pub async fn seed_admin(state: &AppState, email: &str, role: &str) -> Record<Admin> {
    state
        .identity
        .sign_up(email, PASSWORD)
        .await
        .expect("sign-up should succeed");
    state
        .facade
        .create(&Admin {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            role: role.to_string(),
            uid: None,
        })
        .await
        .expect("admin creation should succeed")
}

/// Log in through the API and return the bearer token.
pub async fn login(app: Router, email: &str) -> String {
    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": email, "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login of {email} failed");
    body_json(response).await["token"]
        .as_str()
        .expect("token in login response")
        .to_string()
}

/// Seed an admin with `role` and return a token for it.
pub async fn admin_token(test: &TestApp, email: &str, role: &str) -> String {
    seed_admin(&test.state, email, role).await;
    login(test.app(), email).await
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes()
        .to_vec()
}

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("router is infallible")
}

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    request(method, uri, token)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, request(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        request(Method::GET, uri, Some(token)).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, json_request(Method::POST, uri, None, body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, json_request(Method::POST, uri, Some(token), body)).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, json_request(Method::PUT, uri, Some(token), body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        request(Method::POST, uri, Some(token)).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(
        app,
        request(Method::DELETE, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

/// A `multipart/form-data` request carrying one `file` field.
pub fn multipart_request(
    uri: &str,
    token: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> Request<Body> {
    const BOUNDARY: &str = "atelier-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    request(Method::POST, uri, Some(token))
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}
