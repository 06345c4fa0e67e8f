//! API error type and the JSON error envelope.
//!
//! Every failure returns `{ "success": false, "error": { code,
//! message, details? } }` with a code from the fixed taxonomy. Gates
//! and handlers fail fast; storage and crypto failures are redacted to
//! `INTERNAL_SERVER_ERROR` and logged, never surfaced raw.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rentora_core::error::RentoraError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "INVALID_TOKEN").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional context, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed bearer header (401).
    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    /// External/local token or OTP code failed verification (401).
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Role not allowed, or OTP required but not enrolled (403).
    #[error("insufficient permissions: {0}")]
    InsufficientPermissions(String),

    /// Required field absent or invalid (400).
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced entity absent (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Unexpected storage/external failure (500). Message is logged
    /// but not returned to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::AuthenticationRequired(_) => {
                (StatusCode::UNAUTHORIZED, "AUTHENTICATION_REQUIRED")
            }
            Self::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            Self::InsufficientPermissions(_) => {
                (StatusCode::FORBIDDEN, "INSUFFICIENT_PERMISSIONS")
            }
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
        }
    }

    fn message_and_details(&self) -> (String, Option<String>) {
        match self {
            Self::AuthenticationRequired(details) => (
                "Authentication token is required".into(),
                Some(details.clone()),
            ),
            Self::InvalidToken(details) => {
                ("Invalid or expired token".into(), Some(details.clone()))
            }
            Self::InsufficientPermissions(details) => {
                ("Insufficient permissions".into(), Some(details.clone()))
            }
            Self::Validation(details) => ("Validation failed".into(), Some(details.clone())),
            Self::NotFound(details) => ("Resource not found".into(), Some(details.clone())),
            // Never expose internal error messages to clients.
            Self::Internal(_) => ("Something went wrong".into(), None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let (message, details) = self.message_and_details();

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<RentoraError> for ApiError {
    fn from(err: RentoraError) -> Self {
        match err {
            RentoraError::NotFound { entity, id } => Self::NotFound(format!("{entity} {id}")),
            RentoraError::AlreadyExists { entity } => {
                Self::Validation(format!("{entity} already exists"))
            }
            RentoraError::AuthenticationFailed { reason } => Self::InvalidToken(reason),
            RentoraError::AuthorizationDenied { reason } => Self::InsufficientPermissions(reason),
            RentoraError::Validation { message } => Self::Validation(message),
            RentoraError::Database(msg) | RentoraError::Crypto(msg) | RentoraError::Internal(msg) => {
                Self::Internal(msg)
            }
        }
    }
}
