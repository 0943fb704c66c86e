//! Integration tests for ABC Retailers.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests against the in-memory backend
//! cargo test -p abc-retailers-integration-tests
//!
//! # Azure Storage tests (start Azurite first)
//! azurite --silent --location /tmp/azurite &
//! cargo test -p abc-retailers-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `admin_*` - HTTP flows driven through the router
//! - `azurite_storage` - REST client against the storage emulator

#![cfg_attr(not(test), forbid(unsafe_code))]

use abc_retailers_admin::{
    app, config::AppConfig, state::AppState, storage::StorageServices,
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use tower::ServiceExt;

const MULTIPART_BOUNDARY: &str = "abc-retailers-test-boundary";

/// Largest response body the helpers will buffer.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// An application wired to a fresh in-memory store.
///
/// `storage` shares its backend with the router, so tests can seed records
/// and inspect queues directly.
pub struct TestApp {
    pub router: Router,
    pub storage: StorageServices,
}

impl TestApp {
    /// Build the router over empty, provisioned in-memory storage.
    ///
    /// # Panics
    ///
    /// Panics if provisioning the in-memory store fails.
    pub async fn new() -> Self {
        let storage = StorageServices::in_memory();
        storage
            .ensure_provisioned()
            .await
            .unwrap_or_else(|e| panic!("Failed to provision memory storage: {e}"));

        let state = AppState::new(AppConfig::local_memory(), storage.clone());
        Self {
            router: app(state),
            storage,
        }
    }

    /// Send a request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the router fails, which it never does for `Infallible`
    /// services.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {})
    }

    /// `GET` a path.
    pub async fn get(&self, path: &str) -> Response<Body> {
        self.send(build(Request::get(path), Body::empty())).await
    }

    /// `POST` URL-encoded form fields.
    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.send(build(
            Request::post(path).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded"),
            Body::from(body),
        ))
        .await
    }

    /// `POST` a `multipart/form-data` body of text fields and an optional
    /// file part `(field, filename, content)`.
    pub async fn post_multipart(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
    ) -> Response<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((name, filename, content)) = file {
            body.extend_from_slice(
                format!(
                    "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

        self.send(build(
            Request::post(path).header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            ),
            Body::from(body),
        ))
        .await
    }

    /// `POST` a JSON body.
    pub async fn post_json(&self, path: &str, value: &serde_json::Value) -> Response<Body> {
        self.send(build(
            Request::post(path).header(header::CONTENT_TYPE, "application/json"),
            Body::from(value.to_string()),
        ))
        .await
    }
}

fn build(builder: axum::http::request::Builder, body: Body) -> Request<Body> {
    builder
        .body(body)
        .unwrap_or_else(|e| panic!("Invalid test request: {e}"))
}

/// Read a response body as UTF-8 text.
///
/// # Panics
///
/// Panics if the body cannot be read or is not UTF-8.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), MAX_BODY_BYTES)
        .await
        .unwrap_or_else(|e| panic!("Failed to read body: {e}"));
    String::from_utf8(bytes.to_vec()).unwrap_or_else(|e| panic!("Body is not UTF-8: {e}"))
}

/// Read a response body as JSON.
///
/// # Panics
///
/// Panics if the body is not valid JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let text = body_text(response).await;
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("Body is not JSON ({e}): {text}"))
}
