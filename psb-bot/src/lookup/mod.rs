//! External lookups against the game platform
//!
//! Both lookups are best-effort: failures are logged here and folded into a
//! neutral result before they reach the lifecycle engine.

use std::time::Duration;
use thiserror::Error;

pub mod resolver;
pub mod verifier;

pub use resolver::{IdentityResolver, UsernameLookupResolver};
pub use verifier::{SharePageClassifier, SharePageVerifier, ShareVerifier};

const USER_AGENT: &str = concat!("psb-bot/", env!("CARGO_PKG_VERSION"));

/// Lookup failures (internal; never surfaced to users)
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Lookup timed out")]
    Timeout,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LookupError::Timeout
        } else {
            LookupError::NetworkError(e.to_string())
        }
    }
}

/// Shared HTTP client for all lookups, bounded by `timeout` per request
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}
