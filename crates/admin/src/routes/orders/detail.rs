//! Order detail handler.

use abc_retailers_core::{Order, OrderStatus, RecordKind};
use askama::Template;
use axum::{
    extract::{Path, State},
    response::Html,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::AppError,
    filters,
    middleware::{Flash, take_flash},
    routes::render,
    state::AppState,
};

/// Order detail page template.
#[derive(Template)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub current_path: String,
    pub flashes: Vec<Flash>,
    pub order: Order,
    pub statuses: Vec<String>,
}

/// Order detail page handler.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let order = state
        .storage()
        .entities()
        .find::<Order>(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {id}", RecordKind::Order)))?;

    Ok(render(&OrderShowTemplate {
        current_path: "/orders".to_string(),
        flashes: take_flash(&session).await,
        order,
        statuses: OrderStatus::KNOWN.iter().map(ToString::to_string).collect(),
    }))
}
