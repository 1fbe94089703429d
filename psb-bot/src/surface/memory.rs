//! In-process display surface
//!
//! Used when no webhook is configured: artifacts live in memory and are
//! served through the HTTP adapter. `delete_external` simulates an outside
//! actor removing a message.

use super::{DisplaySurface, SurfaceError};
use crate::artifact::{ArtifactContent, ArtifactId, ArtifactKind};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredArtifact {
    kind: ArtifactKind,
    content: ArtifactContent,
    pinned: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    artifacts: BTreeMap<u64, StoredArtifact>,
    published: usize,
}

#[derive(Debug, Default)]
pub struct MemorySurface {
    state: Mutex<MemoryState>,
}

fn parse_id(id: &ArtifactId) -> Option<u64> {
    id.0.parse().ok()
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove an artifact as an outside actor would. Returns false if it
    /// did not exist.
    pub async fn delete_external(&self, id: &ArtifactId) -> bool {
        let Some(key) = parse_id(id) else {
            return false;
        };
        self.state.lock().await.artifacts.remove(&key).is_some()
    }

    /// Total number of publish calls, including replaced artifacts
    pub async fn published_count(&self) -> usize {
        self.state.lock().await.published
    }

    /// Ids of artifacts of `kind` that still exist, oldest first
    pub async fn live_ids(&self, kind: ArtifactKind) -> Vec<ArtifactId> {
        self.state
            .lock()
            .await
            .artifacts
            .iter()
            .filter(|(_, a)| a.kind == kind)
            .map(|(key, _)| ArtifactId(key.to_string()))
            .collect()
    }

    pub async fn content(&self, id: &ArtifactId) -> Option<ArtifactContent> {
        let key = parse_id(id)?;
        self.state
            .lock()
            .await
            .artifacts
            .get(&key)
            .map(|a| a.content.clone())
    }

    pub async fn is_pinned(&self, id: &ArtifactId) -> bool {
        let Some(key) = parse_id(id) else {
            return false;
        };
        self.state
            .lock()
            .await
            .artifacts
            .get(&key)
            .map(|a| a.pinned)
            .unwrap_or(false)
    }
}

#[async_trait]
impl DisplaySurface for MemorySurface {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn find_authored(&self, kind: ArtifactKind) -> Result<Option<ArtifactId>, SurfaceError> {
        let state = self.state.lock().await;
        // Summaries are looked up among pinned artifacts, like a channel's pins
        Ok(state
            .artifacts
            .iter()
            .find(|(_, a)| a.kind == kind && (kind != ArtifactKind::Summary || a.pinned))
            .map(|(key, _)| ArtifactId(key.to_string())))
    }

    async fn publish(
        &self,
        kind: ArtifactKind,
        content: &ArtifactContent,
    ) -> Result<ArtifactId, SurfaceError> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        state.published += 1;
        let key = state.next_id;
        state.artifacts.insert(
            key,
            StoredArtifact {
                kind,
                content: content.clone(),
                pinned: false,
            },
        );
        Ok(ArtifactId(key.to_string()))
    }

    async fn edit(&self, id: &ArtifactId, content: &ArtifactContent) -> Result<(), SurfaceError> {
        let mut state = self.state.lock().await;
        let stored = parse_id(id)
            .and_then(|key| state.artifacts.get_mut(&key))
            .ok_or_else(|| SurfaceError::Gone(id.clone()))?;
        stored.content = content.clone();
        Ok(())
    }

    async fn pin(&self, id: &ArtifactId) -> Result<(), SurfaceError> {
        let mut state = self.state.lock().await;
        let stored = parse_id(id)
            .and_then(|key| state.artifacts.get_mut(&key))
            .ok_or_else(|| SurfaceError::Gone(id.clone()))?;
        stored.pinned = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::IntakeForm;

    fn content() -> ArtifactContent {
        ArtifactContent::IntakeForm(IntakeForm::for_game("Jailbreak", None))
    }

    #[tokio::test]
    async fn test_edit_after_delete_is_gone() {
        let surface = MemorySurface::new();
        let id = surface.publish(ArtifactKind::IntakeForm, &content()).await.unwrap();
        assert!(surface.edit(&id, &content()).await.is_ok());

        assert!(surface.delete_external(&id).await);
        assert!(matches!(surface.edit(&id, &content()).await, Err(SurfaceError::Gone(_))));
        assert!(!surface.delete_external(&id).await);
    }

    #[tokio::test]
    async fn test_unpinned_summary_is_not_found() {
        let surface = MemorySurface::new();
        let id = surface.publish(ArtifactKind::Summary, &content()).await.unwrap();
        assert_eq!(surface.find_authored(ArtifactKind::Summary).await.unwrap(), None);

        surface.pin(&id).await.unwrap();
        assert!(surface.is_pinned(&id).await);
        assert_eq!(surface.find_authored(ArtifactKind::Summary).await.unwrap(), Some(id));
    }

    #[tokio::test]
    async fn test_find_authored_matches_kind() {
        let surface = MemorySurface::new();
        let form_id = surface.publish(ArtifactKind::IntakeForm, &content()).await.unwrap();
        assert_eq!(
            surface.find_authored(ArtifactKind::IntakeForm).await.unwrap(),
            Some(form_id.clone())
        );
        assert_eq!(surface.content(&form_id).await, Some(content()));
        assert_eq!(surface.live_ids(ArtifactKind::Summary).await, Vec::<ArtifactId>::new());
    }
}
