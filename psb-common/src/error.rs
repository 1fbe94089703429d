//! Common error types for PSB

use thiserror::Error;

/// Common result type for PSB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across PSB services
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot or payload (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
