//! Share page verification
//!
//! Fetches the page a share code resolves to and looks for `/games/<id>/`
//! references. This is a heuristic: anything inconclusive, including every
//! transport failure, yields `PendingVerification` for a human to review.

use super::LookupError;
use crate::error::{Error, Result};
use async_trait::async_trait;
use psb_common::SubmissionStatus;
use regex::Regex;
use tracing::{debug, info};
use url::Url;

/// Initial classification of a share code
#[async_trait]
pub trait ShareVerifier: Send + Sync {
    /// Never fails; inconclusive lookups return `PendingVerification`
    async fn verify(&self, code: &str) -> SubmissionStatus;
}

/// Classifies share page bodies by the game ids they reference
#[derive(Debug, Clone)]
pub struct SharePageClassifier {
    target_game_id: String,
    game_reference: Regex,
}

impl SharePageClassifier {
    pub fn new(target_game_id: &str) -> Self {
        Self {
            target_game_id: target_game_id.to_string(),
            game_reference: Regex::new(r"/games/(\d+)/").expect("static pattern"),
        }
    }

    pub fn classify(&self, body: &str) -> SubmissionStatus {
        let mut saw_other_game = false;

        for captures in self.game_reference.captures_iter(body) {
            if &captures[1] == self.target_game_id {
                return SubmissionStatus::Verified;
            }
            saw_other_game = true;
        }

        if saw_other_game {
            SubmissionStatus::WrongGame
        } else {
            SubmissionStatus::PendingVerification
        }
    }
}

/// HTTP share page verifier
pub struct SharePageVerifier {
    http_client: reqwest::Client,
    page_base: Url,
    classifier: SharePageClassifier,
}

impl SharePageVerifier {
    pub fn new(
        http_client: reqwest::Client,
        share_page_base: &str,
        target_game_id: &str,
    ) -> Result<Self> {
        let page_base = Url::parse(share_page_base).map_err(|e| {
            Error::Config(format!("lookups.share_page_base '{}': {}", share_page_base, e))
        })?;

        Ok(Self {
            http_client,
            page_base,
            classifier: SharePageClassifier::new(target_game_id),
        })
    }

    fn page_url(&self, code: &str) -> Url {
        let mut url = self.page_base.clone();
        url.query_pairs_mut().clear().append_pair("code", code);
        url
    }

    async fn fetch_page(&self, code: &str) -> std::result::Result<String, LookupError> {
        let url = self.page_url(code);
        debug!(url = %url, "Fetching share page");

        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "Share page returned non-success status");
        }

        response.text().await.map_err(LookupError::from)
    }
}

#[async_trait]
impl ShareVerifier for SharePageVerifier {
    async fn verify(&self, code: &str) -> SubmissionStatus {
        match self.fetch_page(code).await {
            Ok(body) => {
                let status = self.classifier.classify(&body);
                info!(code = %code, status = %status, "Share code classified");
                status
            }
            Err(e) => {
                info!(code = %code, error = %e, "Share page lookup inconclusive");
                SubmissionStatus::PendingVerification
            }
        }
    }
}
