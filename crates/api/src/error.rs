//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// No authenticated user on the request.
    Unauthorized(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order creation failed.
    Order(OrderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Order(err) => order_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn order_error_to_response(err: OrderError) -> (StatusCode, String) {
    match &err {
        OrderError::Validation(_)
        | OrderError::ProductNotFound { .. }
        | OrderError::InsufficientStock { .. }
        | OrderError::InvalidShippingMethod(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        OrderError::StockUpdateConflict { .. } => (StatusCode::CONFLICT, err.to_string()),
        OrderError::StorageUnavailable(_) | OrderError::TransactionAborted(_) => {
            tracing::error!(error = %err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            )
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
