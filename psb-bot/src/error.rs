//! Error types for psb-bot
//!
//! Service-level errors (startup, configuration, wiring). Domain outcomes
//! that users see, such as link rejections and moderation failures, have
//! their own types next to the code that produces them.

use thiserror::Error;

/// Main error type for psb-bot
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or value errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client construction errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenience Result type using psb-bot Error
pub type Result<T> = std::result::Result<T, Error>;
