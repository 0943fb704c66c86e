//! Unified error handling for the web application.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::OrderError;
use crate::storage::StorageError;

/// Application-level error type for request handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The record changed since it was read.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Storage(StorageError::ConcurrencyConflict | StorageError::NotFound) => false,
            Self::Storage(_) | Self::Internal(_) => true,
            Self::NotFound(_) | Self::BadRequest(_) | Self::Conflict(_) => false,
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::OrderNotFound => Self::NotFound(err.to_string()),
            OrderError::Storage(storage) => Self::from(storage),
            OrderError::CustomerOrProductMissing
            | OrderError::InvalidQuantity
            | OrderError::InsufficientStock { .. } => Self::BadRequest(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Storage(StorageError::ConcurrencyConflict) | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::Storage(StorageError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(StorageError::Http(_) | StorageError::Service { .. }) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Storage(StorageError::ConcurrencyConflict) => {
                StorageError::ConcurrencyConflict.to_string()
            }
            Self::Storage(StorageError::NotFound) => "Not found".to_string(),
            Self::Storage(StorageError::Http(_) | StorageError::Service { .. }) => {
                "Storage service error".to_string()
            }
            Self::Storage(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Storage(StorageError::ConcurrencyConflict)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Storage(StorageError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_order_errors_map_to_client_errors() {
        let err = AppError::from(OrderError::InsufficientStock {
            product_name: "Tea".to_string(),
            available: 2,
        });
        assert_eq!(
            err.to_string(),
            "Bad request: Insufficient stock for product 'Tea'. Available stock: 2."
        );
        assert!(matches!(
            AppError::from(OrderError::OrderNotFound),
            AppError::NotFound(_)
        ));
    }
}
