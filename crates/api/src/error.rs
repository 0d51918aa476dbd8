//! API error types with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use production::ServiceError;
use serde::Serialize;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    pub details: String,
}

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// The request body could not be read.
    InvalidBody(String),
    /// A use case failed.
    Service(ServiceError),
}

impl ApiError {
    fn status_and_title(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidBody(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation error"),
            ApiError::Service(err) => match err {
                ServiceError::Validation(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "validation error")
                }
                ServiceError::InvalidTransition { .. } => {
                    (StatusCode::BAD_REQUEST, "unable to update order state")
                }
                ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "unable to find the order"),
                ServiceError::AlreadyExists(_) => {
                    (StatusCode::CONFLICT, "unable to create the order")
                }
                ServiceError::DuplicateItem(_) => (StatusCode::CONFLICT, "unable to add an item"),
                ServiceError::Storage(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, title) = self.status_and_title();
        let details = match &self {
            ApiError::InvalidBody(msg) => msg.clone(),
            ApiError::Service(err) => err.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %details, "internal server error");
        }

        let body = ErrorBody {
            code: status.as_u16(),
            message: title.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}
