//! Defines the application's primary error type `AppError` and a convenience `Result` alias.
//!
//! Uses the `thiserror` crate for ergonomic error definition and provides `From`
//! implementations to convert common external errors into `AppError` variants.
//! Errors that do not implement `Clone` are wrapped in `Arc` so a `QueryResult`
//! carrying an `AppError` stays cloneable.

use crate::api::WireError;
use std::sync::Arc;
use thiserror::Error;

/// The primary error enumeration for all application-specific errors.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Network or transport failure reported by `reqwest` (includes timeouts).
    #[error("{0}")]
    Transport(Arc<reqwest::Error>),

    /// The provider answered with a status code we cannot decode a payload from.
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    /// The binary location response could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] WireError),

    /// Error during JSON parsing (`serde_json`). Wrapped in Arc as serde_json::Error is not Clone.
    #[error("{0}")]
    JsonParse(Arc<serde_json::Error>),

    /// The provider needs an API key and none is configured.
    #[error("API key is required")]
    MissingApiKey,

    /// The provider answered but did not know the access point.
    #[error("no location data")]
    NoLocation,

    /// Error message reported by the provider itself, passed through verbatim.
    #[error("{0}")]
    Upstream(String),

    /// The command line argument is not a colon-separated 6-octet hardware address.
    #[error("invalid BSSID format: {0:?}")]
    InvalidBssid(String),

    /// A configuration value from the environment could not be used.
    #[error("Config Error: {0}")]
    Config(String),

    /// A provider task panicked or was cancelled before producing a result.
    #[error("task failed: {0}")]
    Task(String),

    /// Error related to standard I/O operations.
    #[error("I/O Error: {0}")]
    Io(Arc<std::io::Error>),
}

/// A specialized `Result` type using the application's `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// --- From implementations ---
// These allow easy conversion from external error types into AppError
// using the `?` operator. Arc is used for non-Clone error types.

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(Arc::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonParse(Arc::new(err))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Task(err.to_string())
    }
}
