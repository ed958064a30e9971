//! Error types for arbv-sc
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation.

use thiserror::Error;

/// Main error type for the arbv-sc module
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Tracking engine lifecycle errors
    #[error("Tracking error: {0}")]
    Tracking(String),

    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<arbv_common::Error> for Error {
    fn from(err: arbv_common::Error) -> Self {
        match err {
            arbv_common::Error::Config(msg) => Error::Config(msg),
            arbv_common::Error::Io(e) => Error::Io(e),
            arbv_common::Error::NotFound(msg) => Error::NotFound(msg),
            other => Error::Internal(other.to_string()),
        }
    }
}

/// Convenience Result type using arbv-sc Error
pub type Result<T> = std::result::Result<T, Error>;
