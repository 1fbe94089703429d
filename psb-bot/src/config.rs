//! psb-bot configuration
//!
//! Bootstrap configuration is read once from TOML at startup; command-line
//! flags and environment variables override individual values in `main`.
//! Every key is optional and falls back to the compiled defaults below.

use crate::error::{Error, Result};
use psb_common::config::{LoggingConfig, DEFAULT_SNAPSHOT_FILE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default HTTP bind address
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5790";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotConfig {
    /// Root folder for the snapshot and artifact ledger
    pub root_folder: Option<PathBuf>,

    /// HTTP adapter bind address
    pub bind_addr: String,

    /// Snapshot file name (relative to root folder) or absolute path
    pub snapshot_file: String,

    /// The single identity allowed to approve/reject/delete.
    /// `None` disables moderation entirely.
    pub moderator_id: Option<String>,

    /// Community the board belongs to; events from elsewhere are refused.
    /// `None` accepts every community.
    pub community_id: Option<String>,

    /// Display name used in the refusal message
    pub community_name: String,

    pub game: GameConfig,
    pub links: LinkPolicyConfig,
    pub lookups: LookupConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

impl BotConfig {
    /// Reject values that would leave the service unable to work
    pub fn validate(&self) -> Result<()> {
        if self.lookups.timeout_secs == 0 {
            return Err(Error::Config(
                "lookups.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.game.id.trim().is_empty() {
            return Err(Error::Config("game.id must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            snapshot_file: DEFAULT_SNAPSHOT_FILE.to_string(),
            moderator_id: None,
            community_id: None,
            community_name: "the specified server".to_string(),
            game: GameConfig::default(),
            links: LinkPolicyConfig::default(),
            lookups: LookupConfig::default(),
            display: DisplayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Target game the board collects private servers for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub name: String,
    /// Numeric place id the share page must reference to count as verified
    pub id: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            name: "Jailbreak".to_string(),
            id: "606849621".to_string(),
        }
    }
}

/// Share-link acceptance policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkPolicyConfig {
    pub allowed_hosts: Vec<String>,
    /// Substrings that mark a non-allowed host as an impersonation attempt
    pub brand_keywords: Vec<String>,
    /// Base of every canonical link; `?code=<code>` is appended
    pub canonical_base: String,
}

impl Default for LinkPolicyConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: vec!["www.roblox.com".to_string(), "ro.blox.com".to_string()],
            brand_keywords: vec!["roblox".to_string(), "robux".to_string()],
            canonical_base: "https://www.roblox.com/share".to_string(),
        }
    }
}

/// External lookup endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LookupConfig {
    /// Bound on each verifier/resolver request, in seconds
    pub timeout_secs: u64,
    pub share_page_base: String,
    pub user_lookup_url: String,
    pub profile_url_base: String,
}

impl LookupConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            share_page_base: "https://www.roblox.com/share".to_string(),
            user_lookup_url: "https://users.roblox.com/v1/usernames/users".to_string(),
            profile_url_base: "https://www.roblox.com/users".to_string(),
        }
    }
}

/// Where the intake form and the summary are published
///
/// A missing webhook URL keeps that artifact on the in-process surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub intake_webhook_url: Option<String>,
    pub summary_webhook_url: Option<String>,
    /// Public link to the submission form, shown in the intake artifact
    pub intake_url: Option<String>,
}
