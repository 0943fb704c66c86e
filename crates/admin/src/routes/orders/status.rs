//! JSON order status endpoint.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use crate::{services::OrderError, state::AppState, storage::StorageError};

use super::types::{StatusResponse, StatusUpdateInput};

fn reply(status: StatusCode, success: bool, message: impl Into<String>) -> (StatusCode, Json<StatusResponse>) {
    (
        status,
        Json(StatusResponse {
            success,
            message: message.into(),
        }),
    )
}

/// Change an order's status and publish an `OrderStatusChanged` event.
#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<StatusUpdateInput>,
) -> (StatusCode, Json<StatusResponse>) {
    let new_status = input.new_status.trim();
    if new_status.is_empty() {
        return reply(StatusCode::BAD_REQUEST, false, "Status is required.");
    }

    match state.orders().change_status(&id, new_status.into()).await {
        Ok(change) => reply(
            StatusCode::OK,
            true,
            format!(
                "Order status updated successfully to {}.",
                change.order.status
            ),
        ),
        Err(OrderError::OrderNotFound) => reply(StatusCode::NOT_FOUND, false, "Order not found."),
        Err(OrderError::Storage(StorageError::ConcurrencyConflict)) => reply(
            StatusCode::CONFLICT,
            false,
            StorageError::ConcurrencyConflict.to_string(),
        ),
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "Order status update failed");
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                false,
                "The order status could not be updated.",
            )
        }
    }
}
