//! Client error types

use thiserror::Error;
use unidash_core::models::ApiErrorBody;
use unidash_core::{AuthError, ValidationError};

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// 401 that could not be recovered by refreshing the session
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The identity provider failed while fetching a credential
    #[error(transparent)]
    Identity(#[from] AuthError),

    /// Input rejected before sending
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::Unauthenticated(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Build the error for a non-success response, preferring the server's
    /// `{"error": ...}` message over the raw body
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::from_status(status, error_message(status, &body))
    }

    /// Whether the session is gone and the user must sign in again
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated(_))
    }

    /// Whether the API could not be reached at all
    pub fn is_network(&self) -> bool {
        match self {
            Self::Request(err) => !err.is_decode() && err.status().is_none(),
            Self::Identity(err) => err.is_transient(),
            _ => false,
        }
    }
}

pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorBody>(body) {
        return envelope.error;
    }
    if body.trim().is_empty() {
        status.to_string()
    } else {
        body.to_string()
    }
}
