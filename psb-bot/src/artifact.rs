//! Published artifacts and their self-healing slots
//!
//! An [`ArtifactSlot`] remembers the one artifact of its kind that is
//! considered live. Every publish goes through the slot's mutex, so
//! concurrent refreshes and deletion notices produce at most one
//! replacement.

use crate::summary::SummaryView;
use crate::surface::DisplaySurface;
use psb_common::{BoardEvent, EventBus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    IntakeForm,
    Summary,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::IntakeForm => "intake_form",
            ArtifactKind::Summary => "summary",
        }
    }
}

/// Surface-assigned message id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(pub String);

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One input field of the submission form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub id: &'static str,
    pub label: &'static str,
    pub required: bool,
}

/// The message inviting members to submit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntakeForm {
    pub prompt: String,
    pub action_id: &'static str,
    pub action_label: &'static str,
    pub title: &'static str,
    pub fields: Vec<FormField>,
    /// Link to the form when the surface cannot open it inline
    pub intake_url: Option<String>,
}

impl IntakeForm {
    pub const SHARE_LINK_FIELD: &'static str = "server_link";
    pub const USERNAME_FIELD: &'static str = "roblox_username";

    pub fn for_game(game_name: &str, intake_url: Option<String>) -> Self {
        Self {
            prompt: format!(
                "Click the button below to submit your {} private server:",
                game_name
            ),
            action_id: "submit_server",
            action_label: "Submit Private Server",
            title: "Submit Private Server",
            fields: vec![
                FormField {
                    id: Self::SHARE_LINK_FIELD,
                    label: "Private Server Share Link",
                    required: true,
                },
                FormField {
                    id: Self::USERNAME_FIELD,
                    label: "Roblox Username (optional)",
                    required: false,
                },
            ],
            intake_url,
        }
    }
}

/// What a surface is asked to render
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactContent {
    IntakeForm(IntakeForm),
    Summary(SummaryView),
}

/// Holder of the single live artifact of one kind
pub struct ArtifactSlot {
    kind: ArtifactKind,
    surface: Arc<dyn DisplaySurface>,
    events: Arc<EventBus>,
    pin_on_create: bool,
    current: Mutex<Option<ArtifactId>>,
}

impl ArtifactSlot {
    pub fn new(
        kind: ArtifactKind,
        surface: Arc<dyn DisplaySurface>,
        events: Arc<EventBus>,
        pin_on_create: bool,
    ) -> Self {
        Self {
            kind,
            surface,
            events,
            pin_on_create,
            current: Mutex::new(None),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub async fn current(&self) -> Option<ArtifactId> {
        self.current.lock().await.clone()
    }

    /// Startup: adopt an artifact this system authored earlier, or create one.
    ///
    /// Returns `true` when an existing artifact was adopted, meaning the
    /// caller still has to bring its content up to date.
    pub async fn reconcile(&self, content: &ArtifactContent) -> bool {
        let mut current = self.current.lock().await;
        self.adopt_or_create_locked(&mut current, content).await
    }

    /// Make sure some artifact is live without touching one that already is.
    ///
    /// After a failed startup lookup or publish, this retries the same
    /// adopt-or-create step, so a surface that was briefly unreachable
    /// still ends up with exactly one artifact.
    pub async fn ensure(&self, content: &ArtifactContent) -> Option<ArtifactId> {
        let mut current = self.current.lock().await;
        if current.is_none() {
            debug!(kind = self.kind.as_str(), "No live artifact, retrying reconcile");
            self.adopt_or_create_locked(&mut current, content).await;
        }
        current.clone()
    }

    async fn adopt_or_create_locked(
        &self,
        current: &mut Option<ArtifactId>,
        content: &ArtifactContent,
    ) -> bool {
        match self.surface.find_authored(self.kind).await {
            Ok(Some(id)) => {
                info!(kind = self.kind.as_str(), id = %id, "Found existing artifact");
                *current = Some(id);
                true
            }
            Ok(None) => {
                info!(kind = self.kind.as_str(), "No existing artifact, creating");
                self.create_locked(current, content, false).await;
                false
            }
            Err(e) => {
                // Creating blind could duplicate an artifact we failed to see;
                // the next sync or ensure retries the lookup.
                warn!(kind = self.kind.as_str(), error = %e, "Artifact lookup failed");
                false
            }
        }
    }

    /// Bring the live artifact up to date, recreating it if the edit fails
    /// or none is known.
    pub async fn sync(&self, content: &ArtifactContent) -> Option<ArtifactId> {
        let current = self.current.lock().await;
        self.sync_locked(current, content).await
    }

    /// Like [`sync`](Self::sync), but `render` runs only once the slot is
    /// held, so concurrent callers publish in the order they rendered.
    pub async fn sync_with<F, Fut>(&self, render: F) -> Option<ArtifactId>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = ArtifactContent>,
    {
        let current = self.current.lock().await;
        let content = render().await;
        self.sync_locked(current, &content).await
    }

    async fn sync_locked(
        &self,
        mut current: MutexGuard<'_, Option<ArtifactId>>,
        content: &ArtifactContent,
    ) -> Option<ArtifactId> {

        if let Some(id) = current.clone() {
            match self.surface.edit(&id, content).await {
                Ok(()) => {
                    debug!(kind = self.kind.as_str(), id = %id, "Artifact updated");
                    return Some(id);
                }
                Err(e) => {
                    warn!(kind = self.kind.as_str(), id = %id, error = %e, "Artifact edit failed, recreating");
                    *current = None;
                    return self.create_locked(&mut current, content, true).await;
                }
            }
        }

        self.create_locked(&mut current, content, false).await
    }

    /// Deletion notice from the transport. Recreates only if `deleted` is the
    /// live artifact; stale or foreign ids are ignored.
    pub async fn replace_if_current(&self, deleted: &ArtifactId, content: &ArtifactContent) -> bool {
        let content = content.clone();
        self.replace_if_current_with(deleted, || async move { content }).await
    }

    /// Like [`replace_if_current`](Self::replace_if_current), rendering the
    /// replacement only while the slot is held
    pub async fn replace_if_current_with<F, Fut>(&self, deleted: &ArtifactId, render: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = ArtifactContent>,
    {
        let mut current = self.current.lock().await;
        if current.as_ref() != Some(deleted) {
            return false;
        }

        info!(kind = self.kind.as_str(), id = %deleted, "Live artifact deleted, recreating");
        *current = None;
        let content = render().await;
        self.create_locked(&mut current, &content, true).await;
        true
    }

    async fn create_locked(
        &self,
        current: &mut Option<ArtifactId>,
        content: &ArtifactContent,
        replacing: bool,
    ) -> Option<ArtifactId> {
        let id = match self.surface.publish(self.kind, content).await {
            Ok(id) => id,
            Err(e) => {
                error!(kind = self.kind.as_str(), error = %e, "Failed to publish artifact");
                return None;
            }
        };

        if self.pin_on_create {
            if let Err(e) = self.surface.pin(&id).await {
                debug!(kind = self.kind.as_str(), id = %id, error = %e, "Pin failed");
            }
        }

        if replacing {
            self.events.emit_lossy(BoardEvent::ArtifactRecreated {
                kind: self.kind.as_str().to_string(),
                artifact_id: id.0.clone(),
                timestamp: psb_common::time::now(),
            });
        }

        info!(kind = self.kind.as_str(), id = %id, "Published artifact");
        *current = Some(id.clone());
        Some(id)
    }
}

/// Keeps the intake form published
pub struct IntakeFormKeeper {
    slot: ArtifactSlot,
    form: IntakeForm,
}

impl IntakeFormKeeper {
    pub fn new(slot: ArtifactSlot, form: IntakeForm) -> Self {
        Self { slot, form }
    }

    pub fn form(&self) -> &IntakeForm {
        &self.form
    }

    pub async fn current(&self) -> Option<ArtifactId> {
        self.slot.current().await
    }

    /// Adopt or create the intake artifact. An adopted artifact is left as
    /// is; its content only changes with the configuration.
    pub async fn reconcile(&self) {
        self.slot
            .reconcile(&ArtifactContent::IntakeForm(self.form.clone()))
            .await;
    }

    /// Publish the form if no intake artifact is live yet
    pub async fn ensure(&self) -> Option<ArtifactId> {
        self.slot
            .ensure(&ArtifactContent::IntakeForm(self.form.clone()))
            .await
    }

    pub async fn handle_deleted(&self, id: &ArtifactId) -> bool {
        self.slot
            .replace_if_current(id, &ArtifactContent::IntakeForm(self.form.clone()))
            .await
    }
}
