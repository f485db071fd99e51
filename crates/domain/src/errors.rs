//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to produce a profile from the remote source.
///
/// The variants exist for logging and for adapters that want to react to a
/// specific kind; the profile core treats every variant the same way. The
/// type is `Clone` so a single failure can be handed to every caller waiting
/// on a shared fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FetchError {
    /// Stable label suitable for structured log fields.
    pub fn label(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Auth(_) => "auth",
            FetchError::NotFound(_) => "not_found",
            FetchError::InvalidResponse(_) => "invalid_response",
            FetchError::Internal(_) => "internal",
        }
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration I/O error: {0}")]
    Io(String),

    #[error("Configuration parse error: {0}")]
    Parse(String),
}

/// Result type alias for remote fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
