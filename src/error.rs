//! Error types for the ambient context library.
//!
//! Context reads and writes never fail: a missing key is `None`, and unknown or
//! duplicate lifecycle notifications are ignored. Errors only come from the
//! surrounding plumbing (configuration, logging, diagnostics).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Logging initialization failed: {0}")]
    LoggingError(String),

    #[error("Global context manager is already initialized")]
    AlreadyInitialized,

    #[error("Value for key {key} is a {actual}, not a {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for ContextError {
    fn from(err: config::ConfigError) -> Self {
        ContextError::ConfigError(err.to_string())
    }
}
