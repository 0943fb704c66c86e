//! Order edit and delete handlers.

use abc_retailers_core::{Order, OrderStatus, RecordKind};
use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::AppError,
    filters,
    middleware::{Flash, push_flash},
    routes::{failure_message, render},
    state::AppState,
    storage::StorageError,
};

use super::types::OrderEditForm;

/// Order edit form template.
#[derive(Template)]
#[template(path = "orders/edit.html")]
pub struct OrderEditTemplate {
    pub current_path: String,
    pub flashes: Vec<Flash>,
    pub id: String,
    pub form: OrderEditForm,
    pub statuses: Vec<String>,
    pub error: Option<String>,
}

impl OrderEditTemplate {
    fn new(id: &str, form: OrderEditForm, error: Option<String>) -> Self {
        let mut statuses: Vec<String> = OrderStatus::KNOWN.iter().map(ToString::to_string).collect();
        if !form.status.is_empty() && !statuses.contains(&form.status) {
            statuses.push(form.status.clone());
        }
        Self {
            current_path: "/orders".to_string(),
            flashes: Vec::new(),
            id: id.to_string(),
            form,
            statuses,
            error,
        }
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("{} {id}", RecordKind::Order))
}

/// Edit order form handler.
#[instrument(skip(state))]
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let order = state
        .storage()
        .entities()
        .find::<Order>(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;

    Ok(render(&OrderEditTemplate::new(
        &id,
        OrderEditForm::from_order(&order),
        None,
    )))
}

/// Update order handler.
///
/// Copies every submitted field onto a fresh read. No events are published
/// and stock is not adjusted.
#[instrument(skip(state, session, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<OrderEditForm>,
) -> Result<Response, AppError> {
    let entities = state.storage().entities();
    let mut order = entities
        .find::<Order>(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;

    if let Err(message) = form.apply_to(&mut order) {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            render(&OrderEditTemplate::new(&id, form, Some(message))),
        )
            .into_response());
    }

    match entities.update(order).await {
        Ok(_) => {
            push_flash(&session, Flash::success("Order updated successfully.")).await;
            Ok(Redirect::to("/orders").into_response())
        }
        Err(e) => {
            let status = if matches!(e, StorageError::ConcurrencyConflict) {
                StatusCode::CONFLICT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            let message = failure_message("An error occurred while updating the order", &e);
            Ok((
                status,
                render(&OrderEditTemplate::new(&id, form, Some(message))),
            )
                .into_response())
        }
    }
}

/// Delete order handler. Stock is not restored.
#[instrument(skip(state, session))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Redirect {
    let flash = match state
        .storage()
        .entities()
        .delete::<Order>(RecordKind::Order.partition_key(), &id)
        .await
    {
        Ok(()) => Flash::success("Order deleted successfully."),
        Err(e) => Flash::error(failure_message(
            "An error occurred while deleting the order",
            &e,
        )),
    };
    push_flash(&session, flash).await;
    Redirect::to("/orders")
}
