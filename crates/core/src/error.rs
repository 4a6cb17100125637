//! Error types shared by every Unidash crate

use crate::validation::ValidationError;

/// Standard result type for core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Core error types that can be shared across crates
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl CoreError {
    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization_error(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_error(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        Self::invalid_config(err.to_string())
    }
}

/// Errors surfaced by identity provider operations
///
/// `InvalidCredentials` is shown on the login form, `SessionExpired` is
/// terminal for the current session, `Network` is transient and never retried
/// automatically, and `Validation` is raised before any request is made.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Session expired")]
    SessionExpired,

    #[error("Identity provider unreachable: {0}")]
    Network(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Identity provider error: {0}")]
    Provider(String),
}

impl AuthError {
    /// Whether the error came from a transport failure rather than a rejection
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
