//! Common error types for the photo booth services

use thiserror::Error;

/// Common result type for photo booth operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across photo booth services
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested session (or other resource) not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// QR image could not be produced
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
