//! Order list handler.

use abc_retailers_core::Order;
use askama::Template;
use axum::{extract::State, response::Html};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    filters,
    middleware::{Flash, take_flash},
    routes::render,
    state::AppState,
};

/// Orders list page template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub current_path: String,
    pub flashes: Vec<Flash>,
    pub orders: Vec<Order>,
}

/// Orders list page handler. Newest orders first.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> Html<String> {
    let mut flashes = take_flash(&session).await;
    let mut orders = match state.storage().entities().list::<Order>().await {
        Ok(orders) => orders,
        Err(e) => {
            tracing::error!("Failed to fetch orders: {e}");
            flashes.push(Flash::error("Orders could not be loaded."));
            Vec::new()
        }
    };
    orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));

    render(&OrdersIndexTemplate {
        current_path: "/orders".to_string(),
        flashes,
        orders,
    })
}
