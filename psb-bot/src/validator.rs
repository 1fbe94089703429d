//! Share link validation
//!
//! Structural checks only: no I/O, and the same input always produces the
//! same verdict. Accepted links are reduced to their canonical form
//! (`<canonical_base>?code=<code>`) with every other query parameter dropped.

use crate::config::LinkPolicyConfig;
use crate::error::{Error, Result};
use thiserror::Error;
use url::Url;

/// Path of the share endpoint on allowed hosts
const SHARE_PATH: &str = "/share";
const SHARE_CODE_PARAM: &str = "code";

/// Raw game-instance links carry the server code under this parameter
const RAW_PATH_PREFIX: &str = "/games/";
const RAW_SERVER_CODE_PARAM: &str = "privateServerLinkCode";

/// Why a submitted link was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("link could not be parsed as a URL")]
    Malformed,

    /// Host is not allowed but carries the platform brand name
    #[error("host {host} impersonates the platform")]
    Impersonation { host: String },

    #[error("not a recognized share link")]
    NotShareLink,

    /// Raw server reference instead of a share code
    #[error("raw server code instead of a share link")]
    RawServerCode,
}

impl ValidationError {
    /// Impersonation attempts warrant moderator attention beyond the rejection
    pub fn is_severe(&self) -> bool {
        matches!(self, ValidationError::Impersonation { .. })
    }

    /// Text shown to the submitter
    pub fn user_message(&self, game_name: &str) -> String {
        match self {
            ValidationError::Impersonation { .. } => "Permanent Ban, malicious link!".to_string(),
            ValidationError::RawServerCode => {
                "No raw private server, it must be the share code. Please resend.".to_string()
            }
            ValidationError::Malformed | ValidationError::NotShareLink => format!(
                "Invalid link. It must be a private server share link from {}",
                game_name
            ),
        }
    }
}

/// An accepted share link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLink {
    /// Opaque share code, used for verification
    pub code: String,
    /// Canonical form stored on the submission
    pub canonical_link: String,
}

/// Validates raw user input against the configured link policy
#[derive(Debug, Clone)]
pub struct LinkValidator {
    allowed_hosts: Vec<String>,
    brand_keywords: Vec<String>,
    canonical_base: Url,
}

impl LinkValidator {
    pub fn new(policy: &LinkPolicyConfig) -> Result<Self> {
        let mut canonical_base = Url::parse(&policy.canonical_base).map_err(|e| {
            Error::Config(format!(
                "links.canonical_base '{}' is not a URL: {}",
                policy.canonical_base, e
            ))
        })?;
        canonical_base.set_query(None);
        canonical_base.set_fragment(None);

        Ok(Self {
            allowed_hosts: policy.allowed_hosts.iter().map(|h| h.to_ascii_lowercase()).collect(),
            brand_keywords: policy.brand_keywords.iter().map(|k| k.to_ascii_lowercase()).collect(),
            canonical_base,
        })
    }

    pub fn validate(&self, raw: &str) -> std::result::Result<ValidatedLink, ValidationError> {
        let url = Url::parse(raw.trim()).map_err(|_| ValidationError::Malformed)?;
        let host = url
            .host_str()
            .map(|h| h.to_ascii_lowercase())
            .ok_or(ValidationError::Malformed)?;

        if !self.allowed_hosts.iter().any(|allowed| *allowed == host) {
            if self.brand_keywords.iter().any(|keyword| host.contains(keyword.as_str())) {
                return Err(ValidationError::Impersonation { host });
            }
            return Err(ValidationError::NotShareLink);
        }

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ValidationError::NotShareLink);
        }

        if url.path() == SHARE_PATH {
            let code = url
                .query_pairs()
                .find(|(key, _)| key == SHARE_CODE_PARAM)
                .map(|(_, value)| value.into_owned())
                .filter(|code| !code.is_empty());

            if let Some(code) = code {
                let canonical_link = self.canonicalize(&code);
                return Ok(ValidatedLink { code, canonical_link });
            }
        }

        if url.path().starts_with(RAW_PATH_PREFIX)
            && url.query_pairs().any(|(key, _)| key == RAW_SERVER_CODE_PARAM)
        {
            return Err(ValidationError::RawServerCode);
        }

        Err(ValidationError::NotShareLink)
    }

    fn canonicalize(&self, code: &str) -> String {
        let mut canonical = self.canonical_base.clone();
        canonical.query_pairs_mut().append_pair(SHARE_CODE_PARAM, code);
        canonical.to_string()
    }
}
