//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.
//! `NotFound` is the exception: lookups answer 404 with an empty body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use imis_core::ValidationError;
use serde_json::json;

use crate::service::ServiceError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Resource not found (404, empty body)
    NotFound { resource: &'static str, id: String },

    /// Identity already taken (409)
    Conflict { resource: &'static str, id: String },

    /// Internal error (500, logged)
    Internal { message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "message": e.to_string()
                }),
            ),
            Self::NotFound { resource, id } => {
                tracing::debug!(resource, id = %id, "not found");
                return StatusCode::NOT_FOUND.into_response();
            }
            Self::Conflict { resource, id } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "conflict",
                    "message": format!("{} '{}' already exists", resource, id)
                }),
            ),
            Self::Internal { message } => {
                // Log the actual error, return generic message
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(e) => Self::Validation(e),
            ServiceError::NotFound { resource, id } => Self::NotFound { resource, id },
            ServiceError::Conflict { resource, id } => Self::Conflict { resource, id },
            ServiceError::Store(e) => Self::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("response encoding failed: {}", e),
        }
    }
}
