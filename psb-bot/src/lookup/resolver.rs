//! Username → account id lookup

use super::LookupError;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

/// Resolves a free-text game username to its numeric account id
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `None` on no match or any failure
    async fn resolve(&self, username: &str) -> Option<u64>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UsernameLookupRequest<'a> {
    usernames: [&'a str; 1],
    exclude_banned_users: bool,
}

/// Response of the bulk username lookup endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct UsernameLookupResponse {
    #[serde(default)]
    pub data: Vec<UsernameMatch>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernameMatch {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub requested_username: Option<String>,
}

/// HTTP resolver against the platform's username lookup API
pub struct UsernameLookupResolver {
    http_client: reqwest::Client,
    lookup_url: Url,
}

impl UsernameLookupResolver {
    pub fn new(http_client: reqwest::Client, lookup_url: &str) -> Result<Self> {
        let lookup_url = Url::parse(lookup_url).map_err(|e| {
            Error::Config(format!("lookups.user_lookup_url '{}': {}", lookup_url, e))
        })?;
        Ok(Self {
            http_client,
            lookup_url,
        })
    }

    async fn lookup(&self, username: &str) -> std::result::Result<Option<u64>, LookupError> {
        let request = UsernameLookupRequest {
            usernames: [username],
            exclude_banned_users: false,
        };

        let response = self
            .http_client
            .post(self.lookup_url.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::ApiError(status.as_u16(), body));
        }

        let parsed: UsernameLookupResponse = response
            .json()
            .await
            .map_err(|e| LookupError::ParseError(e.to_string()))?;

        Ok(parsed.data.first().map(|m| m.id))
    }
}

#[async_trait]
impl IdentityResolver for UsernameLookupResolver {
    async fn resolve(&self, username: &str) -> Option<u64> {
        match self.lookup(username).await {
            Ok(Some(id)) => {
                info!(username = %username, user_id = id, "Resolved username");
                Some(id)
            }
            Ok(None) => {
                debug!(username = %username, "Username not found");
                None
            }
            Err(e) => {
                info!(username = %username, error = %e, "Username lookup failed");
                None
            }
        }
    }
}
