//! Health checks and the middleware applied to every response.

#![allow(clippy::unwrap_used)]

use abc_retailers_integration_tests::{TestApp, body_text};
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};

#[tokio::test]
async fn test_health_returns_ok() {
    let app = TestApp::new().await;
    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_with_memory_storage() {
    let app = TestApp::new().await;
    assert_eq!(app.get("/health/ready").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers_on_pages() {
    let app = TestApp::new().await;
    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
    assert_eq!(headers[header::CACHE_CONTROL], "no-store, max-age=0");
}

#[tokio::test]
async fn test_static_files_are_cacheable() {
    let app = TestApp::new().await;
    let response = app.get("/static/app.css").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=3600"
    );
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::new().await;
    let request = Request::get("/health")
        .header("x-request-id", "req-abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.headers()["x-request-id"], "req-abc-123");
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let app = TestApp::new().await;
    let response = app.get("/health").await;
    let id = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok(), "not a UUID: {id}");
}

#[tokio::test]
async fn test_dashboard_renders() {
    let app = TestApp::new().await;
    let body = body_text(app.get("/").await).await;
    assert!(body.contains("ABC Retailers"));
}

#[tokio::test]
async fn test_initialize_storage_redirects_home() {
    let app = TestApp::new().await;
    let response = app.post_form("/initialize-storage", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}
