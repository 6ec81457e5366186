//! Error types for the contact relay.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Generic message returned to callers for any failure that is not theirs to fix.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "Something went wrong. Please try again or contact me directly.";

/// Errors that end a contact request early.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to read request body: {0}")]
    Body(String),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Caller-correctable problems with a contact submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Message is required")]
    MessageRequired,

    #[error("Message cannot be empty")]
    MessageEmpty,

    #[error("Invalid JSON payload")]
    MalformedBody(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Notification channel errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} is not configured: missing {missing}")]
    NotConfigured { name: String, missing: String },

    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Channel {name} rejected the message with HTTP {status}: {description}")]
    Rejected {
        name: String,
        status: u16,
        description: String,
    },
}

/// The 500 response body shared by error mapping and panic recovery.
pub fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "status": "error",
            "message": INTERNAL_ERROR_MESSAGE,
        })),
    )
        .into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(e) => {
                if let ValidationError::MalformedBody(ref detail) = e {
                    tracing::debug!(detail = %detail, "Rejected malformed contact payload");
                }
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": e.to_string() })),
                )
                    .into_response()
            }
            Error::Body(reason) => {
                tracing::error!(error = %reason, "Failed to read contact request body");
                internal_error_response()
            }
        }
    }
}
