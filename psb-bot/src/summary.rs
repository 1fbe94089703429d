//! Board summary rendering and synchronization
//!
//! The summary is derived entirely from the store on every refresh; the
//! synchronizer only remembers which published artifact is live.

use crate::artifact::{ArtifactContent, ArtifactId, ArtifactSlot};
use crate::store::SubmissionStore;
use chrono::{DateTime, Utc};
use psb_common::{Submission, SubmissionStatus};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::trace;

/// Embed accent colour
pub const SUMMARY_COLOR: u32 = 0x00AE86;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub verified: usize,
    pub pending: usize,
    pub wrong_game: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn tally(submissions: &[Submission]) -> Self {
        let mut counts = StatusCounts {
            total: submissions.len(),
            ..StatusCounts::default()
        };
        for submission in submissions {
            match submission.status {
                SubmissionStatus::Verified => counts.verified += 1,
                SubmissionStatus::PendingVerification => counts.pending += 1,
                SubmissionStatus::WrongGame => counts.wrong_game += 1,
                SubmissionStatus::Rejected => counts.rejected += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub name: String,
    pub value: String,
}

/// Rendered board, ready for any surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub generated_at: DateTime<Utc>,
    pub counts: StatusCounts,
    pub entries: Vec<SummaryEntry>,
}

impl SummaryView {
    /// Plain-text rendering for logs and markup-free surfaces
    pub fn to_plain_text(&self, submissions: &[Submission], now: DateTime<Utc>) -> String {
        let mut out = format!("{}\n{}\n", self.title, self.description);
        for submission in submissions {
            out.push_str(&format!(
                "#{} {} {} ({})\n",
                submission.id,
                submission.status,
                submission.link,
                psb_common::time::format_relative(&submission.created_at, &now)
            ));
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct SummaryRenderer {
    game_name: String,
    profile_url_base: String,
}

impl SummaryRenderer {
    pub fn new(game_name: &str, profile_url_base: &str) -> Self {
        Self {
            game_name: game_name.to_string(),
            profile_url_base: profile_url_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn game_name(&self) -> &str {
        &self.game_name
    }

    pub fn render(&self, submissions: &[Submission], now: DateTime<Utc>) -> SummaryView {
        let counts = StatusCounts::tally(submissions);
        let description = format!(
            "Total submitted: {} — Verified: {} — Pending: {} — Wrong game: {} — Rejected: {}",
            counts.total, counts.verified, counts.pending, counts.wrong_game, counts.rejected
        );

        let entries = if submissions.is_empty() {
            vec![SummaryEntry {
                name: "No submissions yet".to_string(),
                value: "Be the first to submit a private server!".to_string(),
            }]
        } else {
            submissions.iter().map(|s| self.entry(s)).collect()
        };

        SummaryView {
            title: format!("{} Private Servers List", self.game_name),
            description,
            color: SUMMARY_COLOR,
            generated_at: now,
            counts,
            entries,
        }
    }

    fn entry(&self, submission: &Submission) -> SummaryEntry {
        let username = match submission.external_user_id {
            Some(user_id) if submission.has_username() => format!(
                "[{}]({}/{}/profile)",
                submission.external_username, self.profile_url_base, user_id
            ),
            _ => submission.external_username.clone(),
        };

        SummaryEntry {
            name: format!(
                "Server #{} - {}",
                submission.id,
                submission.status.label(&self.game_name)
            ),
            value: format!(
                "Submitted by: <@{}>\nRoblox Username: {}\nLink: {}\nSubmitted: {}",
                submission.submitter_id,
                username,
                submission.link,
                psb_common::time::relative_markup(&submission.created_at)
            ),
        }
    }
}

/// Keeps the one published summary consistent with the store
pub struct SummarySynchronizer {
    store: Arc<SubmissionStore>,
    renderer: SummaryRenderer,
    slot: ArtifactSlot,
    latest: RwLock<Option<SummaryView>>,
}

impl SummarySynchronizer {
    pub fn new(store: Arc<SubmissionStore>, renderer: SummaryRenderer, slot: ArtifactSlot) -> Self {
        Self {
            store,
            renderer,
            slot,
            latest: RwLock::new(None),
        }
    }

    async fn render_current(&self) -> ArtifactContent {
        let submissions = self.store.all().await;
        let now = psb_common::time::now();
        let view = self.renderer.render(&submissions, now);
        trace!("Rendered summary:\n{}", view.to_plain_text(&submissions, now));
        *self.latest.write().await = Some(view.clone());
        ArtifactContent::Summary(view)
    }

    /// Re-render from the store and update (or recreate) the artifact.
    /// Publishing failures are logged by the slot and retried next refresh.
    ///
    /// The store is read only once the slot is held, so the last refresh to
    /// publish always carries the newest board.
    pub async fn refresh(&self) -> Option<ArtifactId> {
        self.slot.sync_with(|| self.render_current()).await
    }

    /// Startup: adopt or create the summary, then bring it up to date
    pub async fn reconcile(&self) -> Option<ArtifactId> {
        let content = self.render_current().await;
        self.slot.reconcile(&content).await;
        self.refresh().await
    }

    /// Deletion notice; recreates only if `id` is the live summary
    pub async fn handle_deleted(&self, id: &ArtifactId) -> bool {
        if self.slot.current().await.as_ref() != Some(id) {
            return false;
        }
        self.slot
            .replace_if_current_with(id, || self.render_current())
            .await
    }

    pub async fn current(&self) -> Option<ArtifactId> {
        self.slot.current().await
    }

    /// Most recently rendered view, if any refresh has happened
    pub async fn latest(&self) -> Option<SummaryView> {
        self.latest.read().await.clone()
    }

    pub fn renderer(&self) -> &SummaryRenderer {
        &self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactKind;
    use crate::store::NewSubmission;
    use crate::surface::{DisplaySurface, MemorySurface};
    use chrono::TimeZone;
    use psb_common::model::USERNAME_NOT_PROVIDED;
    use psb_common::EventBus;
    use tempfile::TempDir;

    fn submission(id: u32, status: SubmissionStatus, username: &str, user_id: Option<u64>) -> Submission {
        Submission {
            id,
            submitter_id: format!("10{}", id),
            external_username: username.to_string(),
            external_user_id: user_id,
            link: format!("https://www.roblox.com/share?code=C{}", id),
            status,
            created_at: Utc.timestamp_opt(1_758_024_000, 0).unwrap(),
        }
    }

    fn renderer() -> SummaryRenderer {
        SummaryRenderer::new("Jailbreak", "https://www.roblox.com/users/")
    }

    #[test]
    fn test_empty_board() {
        let view = renderer().render(&[], Utc::now());
        assert_eq!(view.title, "Jailbreak Private Servers List");
        assert_eq!(
            view.description,
            "Total submitted: 0 — Verified: 0 — Pending: 0 — Wrong game: 0 — Rejected: 0"
        );
        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.entries[0].name, "No submissions yet");
    }

    #[test]
    fn test_counts_and_entries() {
        let submissions = vec![
            submission(1, SubmissionStatus::Verified, "builderman", Some(156)),
            submission(2, SubmissionStatus::PendingVerification, USERNAME_NOT_PROVIDED, None),
            submission(3, SubmissionStatus::WrongGame, "guest", None),
            submission(4, SubmissionStatus::Rejected, "x", Some(9)),
            submission(5, SubmissionStatus::Verified, "y", None),
        ];
        let view = renderer().render(&submissions, Utc::now());

        assert_eq!(
            view.counts,
            StatusCounts { total: 5, verified: 2, pending: 1, wrong_game: 1, rejected: 1 }
        );
        assert_eq!(view.entries.len(), 5);
        assert_eq!(view.entries[0].name, "Server #1 - ✅ Verified Jailbreak private server");
        assert_eq!(
            view.entries[0].value,
            "Submitted by: <@101>\n\
             Roblox Username: [builderman](https://www.roblox.com/users/156/profile)\n\
             Link: https://www.roblox.com/share?code=C1\n\
             Submitted: <t:1758024000:R>"
        );
        assert!(view.entries[1].value.contains("Roblox Username: not provided\n"));
        assert!(view.entries[2].value.contains("Roblox Username: guest\n"));
    }

    #[test]
    fn test_plain_text_lists_every_submission() {
        let submissions = vec![submission(1, SubmissionStatus::Verified, "a", None)];
        let now = Utc.timestamp_opt(1_758_024_000 + 7_200, 0).unwrap();
        let view = renderer().render(&submissions, now);
        let text = view.to_plain_text(&submissions, now);
        assert!(text.contains("#1 verified https://www.roblox.com/share?code=C1 (2 hours ago)"));
    }

    async fn synchronizer(dir: &TempDir, surface: &Arc<MemorySurface>) -> (Arc<SubmissionStore>, SummarySynchronizer) {
        let store = Arc::new(SubmissionStore::open(dir.path().join("data.json")));
        let dyn_surface: Arc<dyn DisplaySurface> = surface.clone();
        let slot = ArtifactSlot::new(ArtifactKind::Summary, dyn_surface, Arc::new(EventBus::default()), true);
        let sync = SummarySynchronizer::new(Arc::clone(&store), renderer(), slot);
        (store, sync)
    }

    fn draft(n: u32) -> NewSubmission {
        NewSubmission {
            submitter_id: "1".to_string(),
            external_username: USERNAME_NOT_PROVIDED.to_string(),
            external_user_id: None,
            link: format!("https://www.roblox.com/share?code=C{}", n),
            status: SubmissionStatus::Verified,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_refresh_edits_same_artifact() {
        let dir = TempDir::new().unwrap();
        let surface = Arc::new(MemorySurface::new());
        let (store, sync) = synchronizer(&dir, &surface).await;

        let first = sync.reconcile().await.unwrap();
        assert!(surface.is_pinned(&first).await);

        store.append(draft(1)).await;
        let second = sync.refresh().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(surface.published_count().await, 1);

        match surface.content(&first).await {
            Some(ArtifactContent::Summary(view)) => assert_eq!(view.counts.total, 1),
            other => panic!("unexpected content: {:?}", other),
        }
        assert_eq!(sync.latest().await.unwrap().counts.total, 1);
    }

    #[tokio::test]
    async fn test_externally_deleted_summary_recreated_once() {
        let dir = TempDir::new().unwrap();
        let surface = Arc::new(MemorySurface::new());
        let (_store, sync) = synchronizer(&dir, &surface).await;

        let original = sync.reconcile().await.unwrap();
        surface.delete_external(&original).await;

        let replacement = sync.refresh().await.unwrap();
        assert_ne!(original, replacement);
        for _ in 0..3 {
            assert_eq!(sync.refresh().await.unwrap(), replacement);
        }
        assert_eq!(surface.published_count().await, 2);
        assert_eq!(surface.live_ids(ArtifactKind::Summary).await, vec![replacement]);
    }

    #[tokio::test]
    async fn test_deletion_notice_then_refresh_creates_exactly_one() {
        let dir = TempDir::new().unwrap();
        let surface = Arc::new(MemorySurface::new());
        let (_store, sync) = synchronizer(&dir, &surface).await;

        let original = sync.reconcile().await.unwrap();
        surface.delete_external(&original).await;

        assert!(sync.handle_deleted(&original).await);
        // A duplicate notice for the same id is stale now
        assert!(!sync.handle_deleted(&original).await);
        let replacement = sync.current().await.unwrap();
        assert_eq!(sync.refresh().await.unwrap(), replacement);
        assert_eq!(surface.published_count().await, 2);
    }

    #[tokio::test]
    async fn test_reconcile_adopts_pinned_summary() {
        let dir = TempDir::new().unwrap();
        let surface = Arc::new(MemorySurface::new());
        let (_store, first_run) = synchronizer(&dir, &surface).await;
        let published = first_run.reconcile().await.unwrap();

        // Process restart against the same surface
        let (_store, second_run) = synchronizer(&dir, &surface).await;
        assert_eq!(second_run.reconcile().await, Some(published));
        assert_eq!(surface.published_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_published_board_matches_store() {
        let dir = TempDir::new().unwrap();
        let surface = Arc::new(MemorySurface::new());
        let (store, sync) = synchronizer(&dir, &surface).await;
        let sync = Arc::new(sync);
        let live = sync.reconcile().await.unwrap();

        for round in 0..20u32 {
            let mut handles = Vec::new();
            for n in 0..8u32 {
                let store = Arc::clone(&store);
                let sync = Arc::clone(&sync);
                handles.push(tokio::spawn(async move {
                    store.append(draft(round * 8 + n)).await;
                    sync.refresh().await
                }));
            }
            for handle in handles {
                handle.await.unwrap();
            }

            let expected = store.len().await;
            match surface.content(&live).await {
                Some(ArtifactContent::Summary(view)) => assert_eq!(view.counts.total, expected),
                other => panic!("unexpected content: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_after_delete_recreate_once() {
        let dir = TempDir::new().unwrap();
        let surface = Arc::new(MemorySurface::new());
        let (_store, sync) = synchronizer(&dir, &surface).await;
        let sync = Arc::new(sync);

        let original = sync.reconcile().await.unwrap();
        surface.delete_external(&original).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let sync = Arc::clone(&sync);
            handles.push(tokio::spawn(async move { sync.refresh().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(surface.published_count().await, 2);
        assert_eq!(surface.live_ids(ArtifactKind::Summary).await.len(), 1);
    }
}
