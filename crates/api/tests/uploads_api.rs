//! Integration tests for object uploads and deletion.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, body_bytes, body_json, build_test_app, delete_auth, get, multipart_request,
    send, TEST_MAX_UPLOAD_BYTES,
};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

#[tokio::test]
async fn uploaded_images_are_served_from_their_url() {
    let test = build_test_app();
    let token = admin_token(&test, "ada@example.com", "admin").await;

    let response = send(
        test.app(),
        multipart_request(
            "/api/v1/admin/uploads/trainers",
            &token,
            "Ada Portrait.png",
            "image/png",
            PNG_BYTES,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let path = json["data"]["path"].as_str().unwrap().to_string();
    let url = json["data"]["url"].as_str().unwrap().to_string();
    assert!(path.starts_with("trainers/"));
    assert!(path.ends_with("Ada-Portrait.png"), "sanitized name: {path}");
    assert_eq!(url, format!("/uploads/{path}"));
    assert_eq!(json["data"]["size"], PNG_BYTES.len());

    let response = get(test.app(), &url).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, PNG_BYTES);
}

#[tokio::test]
async fn same_filename_gets_distinct_paths() {
    let test = build_test_app();
    let token = admin_token(&test, "ada@example.com", "admin").await;

    let mut paths = Vec::new();
    for _ in 0..2 {
        let response = send(
            test.app(),
            multipart_request(
                "/api/v1/admin/uploads/companies",
                &token,
                "logo.png",
                "image/png",
                PNG_BYTES,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        paths.push(body_json(response).await["data"]["path"].as_str().unwrap().to_string());
    }
    assert_ne!(paths[0], paths[1]);
}

#[tokio::test]
async fn videos_only_accept_video_types() {
    let test = build_test_app();
    let token = admin_token(&test, "ada@example.com", "admin").await;

    let response = send(
        test.app(),
        multipart_request(
            "/api/v1/admin/uploads/videos",
            &token,
            "intro.png",
            "image/png",
            PNG_BYTES,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = send(
        test.app(),
        multipart_request(
            "/api/v1/admin/uploads/videos",
            &token,
            "intro.mp4",
            "video/mp4",
            b"fake-mp4",
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn unknown_folders_are_rejected() {
    let test = build_test_app();
    let token = admin_token(&test, "ada@example.com", "admin").await;

    let response = send(
        test.app(),
        multipart_request(
            "/api/v1/admin/uploads/secrets",
            &token,
            "a.png",
            "image/png",
            PNG_BYTES,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_and_empty_files_are_rejected() {
    let test = build_test_app();
    let token = admin_token(&test, "ada@example.com", "admin").await;

    let too_big = vec![0u8; TEST_MAX_UPLOAD_BYTES as usize + 1];
    let response = send(
        test.app(),
        multipart_request(
            "/api/v1/admin/uploads/workshops",
            &token,
            "banner.png",
            "image/png",
            &too_big,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        test.app(),
        multipart_request(
            "/api/v1/admin/uploads/workshops",
            &token,
            "banner.png",
            "image/png",
            b"",
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_an_object_removes_it_once() {
    let test = build_test_app();
    let token = admin_token(&test, "ada@example.com", "admin").await;

    let response = send(
        test.app(),
        multipart_request(
            "/api/v1/admin/uploads/projects",
            &token,
            "shot.png",
            "image/png",
            PNG_BYTES,
        ),
    )
    .await;
    let path = body_json(response).await["data"]["path"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/admin/uploads?path={path}");
    let response = delete_auth(test.app(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!test.uploads.path().join(&path).exists());

    let response = delete_auth(test.app(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn traversal_paths_are_rejected() {
    let test = build_test_app();
    let token = admin_token(&test, "ada@example.com", "admin").await;

    let response = delete_auth(test.app(), "/api/v1/admin/uploads?path=../x", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn uploads_require_an_admin() {
    let test = build_test_app();
    let response = send(
        test.app(),
        multipart_request(
            "/api/v1/admin/uploads/trainers",
            "not-a-token",
            "a.png",
            "image/png",
            PNG_BYTES,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
