//! Error types for the registration service.

use crate::notify::NotifyError;
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Registration error kinds visible to callers.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Registration not found: {0}")]
    NotFound(String),

    #[error("Registration blocked: {0}")]
    Blocked(String),

    #[error("Invalid pincode ({attempts_remaining} attempts remaining)")]
    InvalidPincode { attempts_remaining: u32 },

    #[error("Failed to send notification: {0}")]
    NotificationFailed(#[source] NotifyError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

impl RegistrationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            RegistrationError::InvalidInput(_) => "INVALID_INPUT",
            RegistrationError::NotFound(_) => "NOT_FOUND",
            RegistrationError::Blocked(_) => "BLOCKED",
            RegistrationError::InvalidPincode { .. } => "INVALID_PINCODE",
            RegistrationError::NotificationFailed(_) => "NOTIFICATION_FAILED",
            RegistrationError::Internal(_) => "INTERNAL_ERROR",
            RegistrationError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            RegistrationError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RegistrationError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistrationError::Blocked(_) => StatusCode::LOCKED,
            RegistrationError::InvalidPincode { .. } => StatusCode::UNAUTHORIZED,
            RegistrationError::NotificationFailed(_) => StatusCode::BAD_GATEWAY,
            RegistrationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RegistrationError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,
}

impl IntoResponse for RegistrationError {
    fn into_response(self) -> Response {
        let attempts_remaining = match &self {
            RegistrationError::InvalidPincode { attempts_remaining } => Some(*attempts_remaining),
            _ => None,
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
            attempts_remaining,
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for RegistrationError {
    fn from(e: StoreError) -> Self {
        RegistrationError::Internal(format!("Storage error: {}", e))
    }
}
