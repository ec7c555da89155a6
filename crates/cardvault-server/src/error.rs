//! HTTP error types for `CardVault` server.
//!
//! Maps domain errors from `cardvault-core` and axum extractor rejections
//! into HTTP responses. Every error variant produces a JSON body with a
//! machine-readable `error` field and a human-readable `message`. Internal
//! errors are logged in full and answered with a generic message.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use cardvault_core::error::{CardError, CredentialError, ValidationError};

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Missing, malformed, invalid, or expired bearer token.
    Unauthorized(String),
    /// Authenticated, but not the owner.
    Forbidden(String),
    /// Requested resource not found.
    NotFound(String),
    /// Client sent invalid input.
    BadRequest(String),
    /// The resource already exists.
    Conflict(String),
    /// Internal server error. The detail is logged, never returned.
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_owned(),
                )
            }
        };

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<CardError> for AppError {
    fn from(err: CardError) -> Self {
        match err {
            CardError::Conflict => Self::Conflict(err.to_string()),
            CardError::NotFound { .. } => Self::NotFound(err.to_string()),
            CardError::Forbidden { .. } => Self::Forbidden(err.to_string()),
            CardError::Invalid { .. } => Self::BadRequest(err.to_string()),
            CardError::CreationFailed { ref source } => {
                Self::Internal(format!("{err} ({source})"))
            }
            CardError::Codec(_) | CardError::Store(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::NotFound { .. } => Self::NotFound(err.to_string()),
            CredentialError::CreationFailed { ref source } => {
                Self::Internal(format!("{err} ({source})"))
            }
            CredentialError::Codec(_) | CredentialError::Store(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
