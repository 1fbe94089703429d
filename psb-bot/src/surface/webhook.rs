//! Webhook display surface
//!
//! Publishes artifacts through a chat-platform webhook (Discord-compatible
//! API): `POST <hook>?wait=true` creates, `PATCH <hook>/messages/<id>` edits,
//! `GET <hook>/messages/<id>` checks existence. Webhooks cannot browse
//! channel history or pin, so published ids are remembered in an
//! [`ArtifactLedger`] file and pinning is a no-op.

use super::{DisplaySurface, SurfaceError};
use crate::artifact::{ArtifactContent, ArtifactId, ArtifactKind, IntakeForm};
use crate::summary::SummaryView;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};
use url::Url;

/// Remembers the last artifact id published per kind, across restarts
pub struct ArtifactLedger {
    path: PathBuf,
    entries: Mutex<HashMap<ArtifactKind, ArtifactId>>,
}

impl ArtifactLedger {
    /// Load the ledger, starting empty if it is missing or unreadable
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable artifact ledger");
                    None
                }
            })
            .unwrap_or_default();

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, kind: ArtifactKind) -> Option<ArtifactId> {
        self.entries.lock().await.get(&kind).cloned()
    }

    pub async fn record(&self, kind: ArtifactKind, id: ArtifactId) {
        let mut entries = self.entries.lock().await;
        entries.insert(kind, id);
        let result = serde_json::to_string_pretty(&*entries)
            .map_err(psb_common::Error::from)
            .and_then(|json| std::fs::write(&self.path, json).map_err(psb_common::Error::from));
        if let Err(e) = result {
            error!(path = %self.path.display(), error = %e, "Failed to save artifact ledger");
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    id: String,
}

pub struct WebhookSurface {
    http_client: reqwest::Client,
    hook_url: Url,
    ledger: Arc<ArtifactLedger>,
}

impl WebhookSurface {
    pub fn new(
        http_client: reqwest::Client,
        hook_url: &str,
        ledger: Arc<ArtifactLedger>,
    ) -> crate::error::Result<Self> {
        let hook_url = Url::parse(hook_url)
            .map_err(|e| crate::error::Error::Config(format!("webhook url '{}': {}", hook_url, e)))?;
        if hook_url.cannot_be_a_base() {
            return Err(crate::error::Error::Config(format!(
                "webhook url '{}' cannot carry message paths",
                hook_url
            )));
        }

        Ok(Self {
            http_client,
            hook_url,
            ledger,
        })
    }

    fn message_url(&self, id: &ArtifactId) -> Url {
        let mut url = self.hook_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("messages").push(&id.0);
        }
        url
    }

    fn transport(e: reqwest::Error) -> SurfaceError {
        SurfaceError::Transport(e.to_string())
    }

    async fn rejected(response: reqwest::Response) -> SurfaceError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        SurfaceError::Rejected { status, body }
    }
}

/// Webhook message body for an artifact
pub fn message_payload(content: &ArtifactContent) -> Value {
    match content {
        ArtifactContent::Summary(view) => summary_payload(view),
        ArtifactContent::IntakeForm(form) => intake_payload(form),
    }
}

fn summary_payload(view: &SummaryView) -> Value {
    let fields: Vec<Value> = view
        .entries
        .iter()
        .map(|entry| json!({ "name": entry.name, "value": entry.value, "inline": false }))
        .collect();

    json!({
        "embeds": [{
            "title": view.title,
            "description": view.description,
            "color": view.color,
            "timestamp": view.generated_at.to_rfc3339(),
            "fields": fields,
        }],
        "allowed_mentions": { "parse": [] },
    })
}

fn intake_payload(form: &IntakeForm) -> Value {
    match &form.intake_url {
        Some(url) => json!({
            "content": form.prompt,
            "components": [{
                "type": 1,
                "components": [{ "type": 2, "style": 5, "label": form.action_label, "url": url }],
            }],
        }),
        None => json!({ "content": form.prompt }),
    }
}

#[async_trait]
impl DisplaySurface for WebhookSurface {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn find_authored(&self, kind: ArtifactKind) -> Result<Option<ArtifactId>, SurfaceError> {
        let Some(id) = self.ledger.get(kind).await else {
            return Ok(None);
        };

        let response = self
            .http_client
            .get(self.message_url(&id))
            .send()
            .await
            .map_err(Self::transport)?;

        match response.status().as_u16() {
            200..=299 => Ok(Some(id)),
            404 => {
                debug!(kind = kind.as_str(), id = %id, "Remembered artifact no longer exists");
                Ok(None)
            }
            _ => Err(Self::rejected(response).await),
        }
    }

    async fn publish(
        &self,
        kind: ArtifactKind,
        content: &ArtifactContent,
    ) -> Result<ArtifactId, SurfaceError> {
        let mut url = self.hook_url.clone();
        url.query_pairs_mut().append_pair("wait", "true");

        let response = self
            .http_client
            .post(url)
            .json(&message_payload(content))
            .send()
            .await
            .map_err(Self::transport)?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        let message: MessageResponse = response
            .json()
            .await
            .map_err(|e| SurfaceError::Decode(e.to_string()))?;
        let id = ArtifactId(message.id);
        self.ledger.record(kind, id.clone()).await;
        Ok(id)
    }

    async fn edit(&self, id: &ArtifactId, content: &ArtifactContent) -> Result<(), SurfaceError> {
        let response = self
            .http_client
            .patch(self.message_url(id))
            .json(&message_payload(content))
            .send()
            .await
            .map_err(Self::transport)?;

        match response.status().as_u16() {
            200..=299 => Ok(()),
            404 => Err(SurfaceError::Gone(id.clone())),
            _ => Err(Self::rejected(response).await),
        }
    }

    async fn pin(&self, id: &ArtifactId) -> Result<(), SurfaceError> {
        debug!(id = %id, "Webhook surfaces cannot pin, skipping");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::build_http_client;
    use crate::lookup::test_support::serve_once;
    use crate::summary::SummaryRenderer;
    use std::time::Duration;
    use tempfile::TempDir;

    fn form_content() -> ArtifactContent {
        ArtifactContent::IntakeForm(IntakeForm::for_game("Jailbreak", None))
    }

    fn surface(base: &str, dir: &TempDir) -> WebhookSurface {
        let ledger = Arc::new(ArtifactLedger::load(dir.path().join("artifacts.json")));
        let client = build_http_client(Duration::from_secs(5)).unwrap();
        WebhookSurface::new(client, &format!("{}/api/webhooks/1/token", base), ledger).unwrap()
    }

    #[test]
    fn test_message_url() {
        let dir = TempDir::new().unwrap();
        let s = surface("https://discord.com", &dir);
        assert_eq!(
            s.message_url(&ArtifactId("77".to_string())).as_str(),
            "https://discord.com/api/webhooks/1/token/messages/77"
        );
    }

    #[test]
    fn test_summary_payload_shape() {
        let renderer = SummaryRenderer::new("Jailbreak", "https://www.roblox.com/users");
        let view = renderer.render(&[], psb_common::time::now());
        let payload = message_payload(&ArtifactContent::Summary(view));

        let embed = &payload["embeds"][0];
        assert_eq!(embed["title"], "Jailbreak Private Servers List");
        assert_eq!(embed["color"], 0x00AE86);
        assert_eq!(embed["fields"][0]["name"], "No submissions yet");
        assert_eq!(payload["allowed_mentions"]["parse"], json!([]));
    }

    #[test]
    fn test_intake_payload_with_link_button() {
        let form = IntakeForm::for_game("Jailbreak", Some("https://psb.example/submit".to_string()));
        let payload = message_payload(&ArtifactContent::IntakeForm(form));
        assert_eq!(payload["components"][0]["components"][0]["url"], "https://psb.example/submit");

        let plain = message_payload(&form_content());
        assert!(plain.get("components").is_none());
    }

    #[tokio::test]
    async fn test_publish_records_ledger() {
        let dir = TempDir::new().unwrap();
        let base = serve_once(200, r#"{"id":"1417000000000000001","channel_id":"5"}"#).await;
        let s = surface(&base, &dir);

        let id = s.publish(ArtifactKind::IntakeForm, &form_content()).await.unwrap();
        assert_eq!(id, ArtifactId("1417000000000000001".to_string()));

        let reloaded = ArtifactLedger::load(dir.path().join("artifacts.json"));
        assert_eq!(reloaded.get(ArtifactKind::IntakeForm).await, Some(id));
    }

    #[tokio::test]
    async fn test_edit_missing_message_is_gone() {
        let dir = TempDir::new().unwrap();
        let base = serve_once(404, r#"{"message":"Unknown Message","code":10008}"#).await;
        let s = surface(&base, &dir);

        let err = s.edit(&ArtifactId("1".to_string()), &form_content()).await.unwrap_err();
        assert!(matches!(err, SurfaceError::Gone(_)));
    }

    #[tokio::test]
    async fn test_find_authored_without_ledger_entry() {
        let dir = TempDir::new().unwrap();
        let s = surface("http://127.0.0.1:9", &dir);
        assert_eq!(s.find_authored(ArtifactKind::Summary).await.unwrap(), None);
    }
}
