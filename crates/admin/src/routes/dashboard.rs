//! Dashboard route handlers.

use abc_retailers_core::{Customer, Order, Product};
use askama::Template;
use axum::{
    extract::State,
    response::{Html, Redirect},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    filters,
    middleware::{Flash, push_flash, take_flash},
    state::AppState,
};

use super::render;

/// Number of products featured on the dashboard.
const FEATURED_PRODUCTS: usize = 5;

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub current_path: String,
    pub flashes: Vec<Flash>,
    pub customer_count: usize,
    pub product_count: usize,
    pub order_count: usize,
    pub featured_products: Vec<Product>,
}

/// Dashboard page handler.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> Html<String> {
    let entities = state.storage().entities();
    let (customers, products, orders) = tokio::join!(
        entities.list::<Customer>(),
        entities.list::<Product>(),
        entities.list::<Order>(),
    );

    let customer_count = customers
        .map_err(|e| tracing::error!("Failed to fetch customers: {e}"))
        .map_or(0, |c| c.len());
    let order_count = orders
        .map_err(|e| tracing::error!("Failed to fetch orders: {e}"))
        .map_or(0, |o| o.len());
    let products = products.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch products: {e}");
        Vec::new()
    });

    let template = DashboardTemplate {
        current_path: "/".to_string(),
        flashes: take_flash(&session).await,
        customer_count,
        product_count: products.len(),
        order_count,
        featured_products: products.into_iter().take(FEATURED_PRODUCTS).collect(),
    };

    render(&template)
}

/// Provision every storage resource the app uses.
#[instrument(skip(state, session))]
pub async fn initialize_storage(State(state): State<AppState>, session: Session) -> Redirect {
    let flash = match state.storage().ensure_provisioned().await {
        Ok(()) => Flash::success("Azure Storage initialized successfully!"),
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "Storage initialization failed");
            Flash::error("Failed to initialize storage. Check the storage connection settings.")
        }
    };
    push_flash(&session, flash).await;
    Redirect::to("/")
}
