//! Axum-specific error types and mappings from core errors to HTTP
//! status codes and JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hawker_core::ports::ProductStoreError;
use serde::Serialize;
use thiserror::Error;

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Dependent service down (product store, TTS upstream).
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            HttpError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            HttpError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<ProductStoreError> for HttpError {
    fn from(err: ProductStoreError) -> Self {
        match err {
            ProductStoreError::NotFound(id) => HttpError::NotFound(format!("product {id} not found")),
            ProductStoreError::Storage(msg) => HttpError::ServiceUnavailable(msg),
        }
    }
}
