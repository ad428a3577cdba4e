//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;
use fulfillment::FulfillmentError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Fulfillment core error.
    Fulfillment(FulfillmentError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn fulfillment_error_to_response(err: FulfillmentError) -> (StatusCode, String) {
    match &err {
        FulfillmentError::Order(order_err) => match order_err {
            OrderError::InvalidTransition { .. } | OrderError::InvalidPaymentTransition { .. } => {
                (StatusCode::CONFLICT, err.to_string())
            }
            OrderError::EmptyOrder
            | OrderError::InvalidQuantity { .. }
            | OrderError::IncompleteAddress { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        },
        FulfillmentError::ProductNotFound { .. } | FulfillmentError::OrderNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        FulfillmentError::InsufficientStock { .. } | FulfillmentError::UpdateConflict(_) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        FulfillmentError::Store(_) => {
            tracing::error!(error = %err, "store failure surfaced to API");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}
