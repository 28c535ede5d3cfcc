//! HTTP-level integration tests for sign-in, sign-up, sessions and admin
//! management.

mod common;

use atelier_db::models::admin::Admin;
use axum::http::StatusCode;
use common::{
    admin_token, body_json, build_test_app, delete_auth, get, get_auth, login, post_auth,
    post_json, post_json_auth, put_json_auth, seed_admin, PASSWORD,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_returns_token_and_admin() {
    let test = build_test_app();
    seed_admin(&test.state, "ada@example.com", "admin").await;

    let response = post_json(
        test.app(),
        "/api/v1/auth/login",
        json!({ "email": "ada@example.com", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["token"].is_string());
    assert_eq!(json["expires_in"], 3600);
    assert_eq!(json["admin"]["email"], "ada@example.com");
    assert_eq!(json["admin"]["role"], "admin");
    assert!(
        json["admin"]["uid"].is_string(),
        "first sign-in links the admin to its identity"
    );
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let test = build_test_app();
    seed_admin(&test.state, "ada@example.com", "admin").await;

    let response = post_json(
        test.app(),
        "/api/v1/auth/login",
        json!({ "email": "ada@example.com", "password": "not-the-password" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn identity_without_admin_record_is_forbidden() {
    let test = build_test_app();
    test.state
        .identity
        .sign_up("visitor@example.com", PASSWORD)
        .await
        .unwrap();

    let response = post_json(
        test.app(),
        "/api/v1/auth/login",
        json!({ "email": "visitor@example.com", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(test.state.sessions.count().await, 0);
}

#[tokio::test]
async fn blank_credentials_are_rejected() {
    let test = build_test_app();
    let response = post_json(
        test.app(),
        "/api/v1/auth/login",
        json!({ "email": " ", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn session_reports_the_signed_in_admin() {
    let test = build_test_app();
    let token = admin_token(&test, "ada@example.com", "super_admin").await;

    let response = get_auth(test.app(), "/api/v1/auth/session", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "ada@example.com");
    assert_eq!(json["data"]["role"], "super_admin");
    assert_eq!(json["data"]["phase"], "authenticated");
}

#[tokio::test]
async fn logout_makes_the_token_unusable() {
    let test = build_test_app();
    let token = admin_token(&test, "ada@example.com", "admin").await;

    let response = post_auth(test.app(), "/api/v1/auth/logout", &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(test.app(), "/api/v1/admin/workshops", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_require_a_token() {
    let test = build_test_app();

    let response = get(test.app(), "/api/v1/admin/workshops").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(test.app(), "/api/v1/admin/workshops", "garbage").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Sign-up and access requests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signup_files_a_pending_request_without_granting_access() {
    let test = build_test_app();
    let super_token = admin_token(&test, "root@example.com", "super_admin").await;

    let response = post_json(
        test.app(),
        "/api/v1/auth/signup",
        json!({ "email": "New@Example.com", "password": PASSWORD, "name": "Newcomer" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let request = body_json(response).await;
    assert_eq!(request["data"]["status"], "pending");
    assert_eq!(request["data"]["email"], "new@example.com");

    // Registered but not yet an admin.
    let response = post_json(
        test.app(),
        "/api/v1/auth/login",
        json!({ "email": "new@example.com", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(
        test.app(),
        "/api/v1/admin/login-requests?status=pending",
        &super_token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn signup_validates_email_and_password() {
    let test = build_test_app();

    let response = post_json(
        test.app(),
        "/api/v1/auth/signup",
        json!({ "email": "not-an-email", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        test.app(),
        "/api/v1/auth/signup",
        json!({ "email": "short@example.com", "password": "short" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let test = build_test_app();
    let body = json!({ "email": "dup@example.com", "password": PASSWORD });

    let first = post_json(test.app(), "/api/v1/auth/signup", body.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let second = post_json(test.app(), "/api/v1/auth/signup", body).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn approving_a_request_grants_access() {
    let test = build_test_app();
    let super_token = admin_token(&test, "root@example.com", "super_admin").await;

    let response = post_json(
        test.app(),
        "/api/v1/auth/signup",
        json!({ "email": "grace@example.com", "password": PASSWORD, "name": "Grace" }),
    )
    .await;
    let request_id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = post_auth(
        test.app(),
        &format!("/api/v1/admin/login-requests/{request_id}/approve"),
        &super_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["request"]["status"], "approved");
    assert_eq!(json["data"]["admin"]["name"], "Grace");
    assert_eq!(json["data"]["admin"]["role"], "admin");

    login(test.app(), "grace@example.com").await;

    // A reviewed request cannot be reviewed again.
    let response = post_auth(
        test.app(),
        &format!("/api/v1/admin/login-requests/{request_id}/reject"),
        &super_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Admin management
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_management_requires_super_admin() {
    let test = build_test_app();
    let token = admin_token(&test, "ada@example.com", "admin").await;

    let response = get_auth(test.app(), "/api/v1/admin/admins", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(
        test.app(),
        "/api/v1/admin/admins",
        json!({ "name": "Eve", "email": "eve@example.com" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn creating_an_admin_twice_conflicts() {
    let test = build_test_app();
    let token = admin_token(&test, "root@example.com", "super_admin").await;
    let body = json!({ "name": "Ada", "email": "Ada@Example.com" });

    let response = post_json_auth(test.app(), "/api/v1/admin/admins", body.clone(), &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["email"], "ada@example.com");

    let response = post_json_auth(test.app(), "/api/v1/admin/admins", body, &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_roles_are_rejected() {
    let test = build_test_app();
    let token = admin_token(&test, "root@example.com", "super_admin").await;

    let response = post_json_auth(
        test.app(),
        "/api/v1/admin/admins",
        json!({ "name": "Mallory", "email": "mallory@example.com", "role": "owner" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_an_admin_invalidates_its_sessions() {
    let test = build_test_app();
    let super_token = admin_token(&test, "root@example.com", "super_admin").await;
    let ada = seed_admin(&test.state, "ada@example.com", "admin").await;
    let ada_token = login(test.app(), "ada@example.com").await;

    let response = get_auth(test.app(), "/api/v1/admin/workshops", &ada_token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = delete_auth(
        test.app(),
        &format!("/api/v1/admin/admins/{}", ada.id),
        &super_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(test.app(), "/api/v1/admin/workshops", &ada_token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(test.state.facade.get::<Admin>(&ada.id).await.unwrap().is_none());
}

#[tokio::test]
async fn admins_cannot_delete_themselves() {
    let test = build_test_app();
    let root = seed_admin(&test.state, "root@example.com", "super_admin").await;
    let token = login(test.app(), "root@example.com").await;

    let response = delete_auth(
        test.app(),
        &format!("/api/v1/admin/admins/{}", root.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn demoting_an_admin_applies_to_open_sessions() {
    let test = build_test_app();
    let root_token = admin_token(&test, "root@example.com", "super_admin").await;
    let bob = seed_admin(&test.state, "bob@example.com", "super_admin").await;
    let bob_token = login(test.app(), "bob@example.com").await;

    let response = get_auth(test.app(), "/api/v1/admin/admins", &bob_token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put_json_auth(
        test.app(),
        &format!("/api/v1/admin/admins/{}", bob.id),
        json!({ "role": "admin" }),
        &root_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["role"], "admin");

    let response = get_auth(test.app(), "/api/v1/admin/admins", &bob_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Still signed in, just with fewer rights.
    let response = get_auth(test.app(), "/api/v1/auth/session", &bob_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["role"], "admin");
}

#[tokio::test]
async fn admin_emails_stay_lowercase_and_unique_on_update() {
    let test = build_test_app();
    let root_token = admin_token(&test, "root@example.com", "super_admin").await;
    let ada = seed_admin(&test.state, "ada@example.com", "admin").await;
    seed_admin(&test.state, "grace@example.com", "admin").await;
    let ada_token = login(test.app(), "ada@example.com").await;
    let uri = format!("/api/v1/admin/admins/{}", ada.id);

    let response = put_json_auth(
        test.app(),
        &uri,
        json!({ "email": "Grace@Example.com" }),
        &root_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Her own address in another case is not a change.
    let response = put_json_auth(
        test.app(),
        &uri,
        json!({ "email": "ADA@example.com", "uid": "forged" }),
        &root_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "ada@example.com");
    assert_ne!(json["data"]["uid"], "forged");
    let response = get_auth(test.app(), "/api/v1/admin/workshops", &ada_token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put_json_auth(
        test.app(),
        &uri,
        json!({ "email": " Ada.Lovelace@Example.com " }),
        &root_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "ada.lovelace@example.com");
    assert!(json["data"]["uid"].is_null());

    let response = get_auth(test.app(), "/api/v1/admin/workshops", &ada_token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    test.state
        .identity
        .sign_up("ada.lovelace@example.com", PASSWORD)
        .await
        .unwrap();
    login(test.app(), "Ada.Lovelace@example.com").await;
}
