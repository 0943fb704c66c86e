//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (table service round-trip)
//!
//! # Dashboard
//! GET  /                           - Counts and featured products
//! POST /initialize-storage         - Provision tables, containers, queues, shares
//!
//! # Customers
//! GET  /customers                  - Customer listing
//! GET  /customers/new              - Create form
//! POST /customers                  - Create customer
//! GET  /customers/{id}/edit        - Edit form
//! POST /customers/{id}             - Update customer
//! POST /customers/{id}/delete      - Delete customer
//!
//! # Products (multipart, optional image)
//! GET  /products                   - Product listing
//! GET  /products/new               - Create form
//! POST /products                   - Create product
//! GET  /products/{id}/edit         - Edit form
//! POST /products/{id}              - Update product
//! POST /products/{id}/delete       - Delete product
//!
//! # Orders
//! GET  /orders                     - Order listing
//! GET  /orders/new                 - Create form
//! POST /orders                     - Place order
//! GET  /orders/{id}                - Order detail
//! GET  /orders/{id}/edit           - Edit form
//! POST /orders/{id}                - Update order
//! POST /orders/{id}/delete         - Delete order
//! POST /orders/{id}/status         - Change status (JSON)
//!
//! # API
//! GET  /api/products/{id}/price    - Price and stock lookup (JSON)
//!
//! # Uploads
//! GET  /uploads                    - Proof-of-payment form
//! POST /uploads                    - Upload proof of payment
//! GET  /uploads/files/{name}       - Download a proof from the file share
//! ```

use askama::Template;
use axum::{
    Router,
    extract::multipart::{Field, MultipartError},
    response::Html,
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;
use crate::storage::StorageError;

pub mod api;
pub mod customers;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod products;
pub mod uploads;

/// Build the application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Dashboard
        .route("/", get(dashboard::index))
        .route("/initialize-storage", post(dashboard::initialize_storage))
        // Customers
        .route("/customers", get(customers::index).post(customers::create))
        .route("/customers/new", get(customers::new_form))
        .route("/customers/{id}", post(customers::update))
        .route("/customers/{id}/edit", get(customers::edit_form))
        .route("/customers/{id}/delete", post(customers::delete))
        // Products
        .route("/products", get(products::index).post(products::create))
        .route("/products/new", get(products::new_form))
        .route("/products/{id}", post(products::update))
        .route("/products/{id}/edit", get(products::edit_form))
        .route("/products/{id}/delete", post(products::delete))
        // Orders
        .route("/orders", get(orders::index).post(orders::create))
        .route("/orders/new", get(orders::new_form))
        .route("/orders/{id}", get(orders::show).post(orders::update))
        .route("/orders/{id}/edit", get(orders::edit_form))
        .route("/orders/{id}/delete", post(orders::delete))
        .route("/orders/{id}/status", post(orders::update_status))
        // API
        .route("/api/products/{id}/price", get(api::product_price))
        // Uploads
        .route("/uploads", get(uploads::index).post(uploads::upload))
        .route("/uploads/files/{name}", get(uploads::download))
}

/// Render a template, falling back to a plain error body.
pub(crate) fn render<T: Template>(template: &T) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// User-facing message for a failed storage write.
///
/// Conflicts are shown as-is. Anything else is reported to Sentry and shown
/// without service details.
pub(crate) fn failure_message(context: &str, err: &StorageError) -> String {
    match err {
        StorageError::ConcurrencyConflict | StorageError::AlreadyExists => {
            format!("{context}: {err}")
        }
        _ => {
            let event_id = sentry::capture_error(err);
            tracing::error!(error = %err, sentry_event_id = %event_id, "{context}");
            format!("{context}. Please try again.")
        }
    }
}

/// A file part of a multipart form.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Read a file field. Browsers send an empty part when no file is chosen.
    pub(crate) async fn read(field: Field<'_>) -> Result<Option<Self>, AppError> {
        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await.map_err(multipart_error)?;
        if filename.is_empty() || content.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            filename,
            content: content.to_vec(),
        }))
    }
}

pub(crate) fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}
