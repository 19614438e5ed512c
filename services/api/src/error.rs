//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and the single
//! place where errors are turned into HTTP responses.

use crate::config::ConfigError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lesson_booking_core::ServiceError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the lesson or order services.
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// The request body could not be read as the expected JSON shape.
    #[error("Malformed request body: {0}")]
    Json(#[from] JsonRejection),

    #[error("{0}")]
    NotFound(String),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Service(ServiceError::Validation(_)) | ApiError::Json(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Service(ServiceError::NotFound(_)) | ApiError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Service(ServiceError::Connection(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Service(ServiceError::Store(_)) | ApiError::Config(_) | ApiError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message shown to clients. Server-side failures only ever expose a
    /// generic message; their detail goes to the log.
    fn public_message(&self) -> String {
        match self {
            ApiError::Service(ServiceError::Validation(msg))
            | ApiError::Service(ServiceError::NotFound(msg))
            | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Json(rejection) => rejection.body_text(),
            ApiError::Service(ServiceError::Connection(_)) => "Database unavailable".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = ErrorResponse {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
