//! Submission store
//!
//! Owns the ordered submission collection and its JSON snapshot. All
//! mutations (append, status change, removal) run under one async mutex, so
//! their read-modify-write steps never interleave and id allocation happens
//! inside the same critical section as the append.
//!
//! Invariant: ids are exactly `1..=len` in collection order after every
//! mutation.

use chrono::{DateTime, Utc};
use psb_common::{Submission, SubmissionStatus};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no submission with link {link}")]
    NotFound { link: String },
}

/// A submission before its id is allocated
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub submitter_id: String,
    pub external_username: String,
    pub external_user_id: Option<u64>,
    pub link: String,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
}

impl NewSubmission {
    fn with_id(self, id: u32) -> Submission {
        Submission {
            id,
            submitter_id: self.submitter_id,
            external_username: self.external_username,
            external_user_id: self.external_user_id,
            link: self.link,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

pub struct SubmissionStore {
    submissions: Mutex<Vec<Submission>>,
    snapshot_path: PathBuf,
}

impl SubmissionStore {
    /// Load the snapshot at `snapshot_path`, or start empty.
    ///
    /// A missing or unreadable snapshot never fails startup. Loaded records
    /// are renumbered densely (the snapshot is rewritten if that changed
    /// anything).
    pub fn open(snapshot_path: impl Into<PathBuf>) -> Self {
        let snapshot_path = snapshot_path.into();
        let mut submissions = load_snapshot(&snapshot_path);

        submissions.sort_by_key(|s| s.id);
        if renumber(&mut submissions) {
            info!(count = submissions.len(), "Snapshot ids were not dense, renumbered");
            write_snapshot(&snapshot_path, &submissions);
        }

        Self {
            submissions: Mutex::new(submissions),
            snapshot_path,
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Allocate the next id, append, and persist as one step
    pub async fn append(&self, draft: NewSubmission) -> Submission {
        let mut submissions = self.submissions.lock().await;
        let id = next_id_of(&submissions);
        let submission = draft.with_id(id);
        submissions.push(submission.clone());
        write_snapshot(&self.snapshot_path, &submissions);

        debug!(id, link = %submission.link, "Appended submission");
        submission
    }

    /// Id the next append would receive right now
    pub async fn next_id(&self) -> u32 {
        next_id_of(&self.submissions.lock().await)
    }

    pub async fn find(&self, link: &str) -> Option<Submission> {
        self.submissions
            .lock()
            .await
            .iter()
            .find(|s| s.link == link)
            .cloned()
    }

    /// Set the status of the submission with exactly this link.
    ///
    /// Returns the previous status and the updated record.
    pub async fn set_status(
        &self,
        link: &str,
        status: SubmissionStatus,
    ) -> Result<(SubmissionStatus, Submission), StoreError> {
        let mut submissions = self.submissions.lock().await;
        let submission = submissions
            .iter_mut()
            .find(|s| s.link == link)
            .ok_or_else(|| StoreError::NotFound {
                link: link.to_string(),
            })?;

        let previous = submission.status;
        submission.status = status;
        let updated = submission.clone();
        write_snapshot(&self.snapshot_path, &submissions);

        Ok((previous, updated))
    }

    /// Remove the submission with exactly this link and compact the ids of
    /// the rest, preserving their relative order.
    ///
    /// Returns the removed record and the number left right after removal.
    pub async fn remove(&self, link: &str) -> Result<(Submission, usize), StoreError> {
        let mut submissions = self.submissions.lock().await;
        let index = submissions
            .iter()
            .position(|s| s.link == link)
            .ok_or_else(|| StoreError::NotFound {
                link: link.to_string(),
            })?;

        let removed = submissions.remove(index);
        renumber(&mut submissions);
        write_snapshot(&self.snapshot_path, &submissions);

        Ok((removed, submissions.len()))
    }

    /// Consistent copy of the whole collection, in id order
    pub async fn all(&self) -> Vec<Submission> {
        self.submissions.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.submissions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.submissions.lock().await.is_empty()
    }
}

fn next_id_of(submissions: &[Submission]) -> u32 {
    submissions.len() as u32 + 1
}

/// Assign ids 1..=N in current order. Returns true if any id changed.
fn renumber(submissions: &mut [Submission]) -> bool {
    let mut changed = false;
    for (index, submission) in submissions.iter_mut().enumerate() {
        let id = index as u32 + 1;
        if submission.id != id {
            submission.id = id;
            changed = true;
        }
    }
    changed
}

fn load_snapshot(path: &Path) -> Vec<Submission> {
    if !path.exists() {
        info!(path = %path.display(), "No snapshot found, starting fresh");
        return Vec::new();
    }

    let loaded = std::fs::read_to_string(path)
        .map_err(psb_common::Error::from)
        .and_then(|raw| serde_json::from_str::<Vec<Submission>>(&raw).map_err(psb_common::Error::from));

    match loaded {
        Ok(submissions) => {
            info!(count = submissions.len(), "Loaded submissions from snapshot");
            submissions
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load snapshot, starting empty");
            Vec::new()
        }
    }
}

/// Overwrite the snapshot: write a sibling temp file, then rename over the
/// original. Failures are logged; memory stays authoritative.
fn write_snapshot(path: &Path, submissions: &[Submission]) {
    if let Err(e) = try_write_snapshot(path, submissions) {
        error!(path = %path.display(), error = %e, "Failed to save snapshot");
    }
}

fn try_write_snapshot(path: &Path, submissions: &[Submission]) -> psb_common::Result<()> {
    let json = serde_json::to_string_pretty(submissions)?;
    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn draft(link: &str) -> NewSubmission {
        NewSubmission {
            submitter_id: "42".to_string(),
            external_username: "builderman".to_string(),
            external_user_id: Some(156),
            link: link.to_string(),
            status: SubmissionStatus::PendingVerification,
            created_at: Utc::now(),
        }
    }

    fn link(n: u32) -> String {
        format!("https://www.roblox.com/share?code=C{}", n)
    }

    fn ids(submissions: &[Submission]) -> Vec<u32> {
        submissions.iter().map(|s| s.id).collect()
    }

    fn open_in(dir: &TempDir) -> SubmissionStore {
        SubmissionStore::open(dir.path().join("data.json"))
    }

    #[tokio::test]
    async fn test_append_assigns_dense_ids() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir);

        assert_eq!(store.next_id().await, 1);
        for n in 1..=3 {
            let s = store.append(draft(&link(n))).await;
            assert_eq!(s.id, n);
        }
        assert_eq!(ids(&store.all().await), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_remove_middle_compacts_preserving_order() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir);
        for n in 1..=3 {
            store.append(draft(&link(n))).await;
        }

        let (removed, remaining_count) = store.remove(&link(2)).await.unwrap();
        assert_eq!(removed.id, 2);
        assert_eq!(remaining_count, 2);

        let remaining = store.all().await;
        assert_eq!(ids(&remaining), vec![1, 2]);
        assert_eq!(remaining[0].link, link(1));
        assert_eq!(remaining[1].link, link(3));
    }

    #[tokio::test]
    async fn test_remove_unknown_link_leaves_store_untouched() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir);
        store.append(draft(&link(1))).await;
        let before = store.all().await;

        let err = store.remove("https://www.roblox.com/share?code=NOPE").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(store.all().await, before);
    }

    #[tokio::test]
    async fn test_set_status_returns_previous() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir);
        store.append(draft(&link(1))).await;

        let (previous, updated) = store
            .set_status(&link(1), SubmissionStatus::Verified)
            .await
            .unwrap();
        assert_eq!(previous, SubmissionStatus::PendingVerification);
        assert_eq!(updated.status, SubmissionStatus::Verified);
        assert_eq!(store.find(&link(1)).await.unwrap().status, SubmissionStatus::Verified);
    }

    #[tokio::test]
    async fn test_set_status_requires_exact_link() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir);
        store.append(draft(&link(1))).await;

        let result = store
            .set_status(&format!("{}&ref=x", link(1)), SubmissionStatus::Rejected)
            .await;
        assert!(result.is_err());
        assert_eq!(
            store.find(&link(1)).await.unwrap().status,
            SubmissionStatus::PendingVerification
        );
    }

    #[tokio::test]
    async fn test_mutations_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        {
            let store = open_in(&dir);
            for n in 1..=4 {
                store.append(draft(&link(n))).await;
            }
            store.set_status(&link(4), SubmissionStatus::Rejected).await.unwrap();
            store.remove(&link(1)).await.unwrap();
        }

        let reopened = open_in(&dir);
        let all = reopened.all().await;
        assert_eq!(ids(&all), vec![1, 2, 3]);
        assert_eq!(all[0].link, link(2));
        assert_eq!(all[2].status, SubmissionStatus::Rejected);
        assert!(!dir.path().join("data.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_snapshot_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_starts_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("data.json"), "{ not json").unwrap();

        let store = open_in(&dir);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_gapped_snapshot_is_renumbered_on_load() {
        let dir = TempDir::new().unwrap();
        let raw = format!(
            r#"[
              {{"id": 7, "userId": "1", "robloxUsername": "a", "link": "{}", "status": "verified", "timestamp": "2025-09-16T12:00:00Z"}},
              {{"id": 2, "userId": "2", "robloxUsername": "b", "link": "{}", "status": "❌ Wrong game", "timestamp": "2025-09-16T12:00:00Z"}}
            ]"#,
            link(7),
            link(2)
        );
        std::fs::write(dir.path().join("data.json"), raw).unwrap();

        let store = open_in(&dir);
        let all = store.all().await;
        assert_eq!(ids(&all), vec![1, 2]);
        assert_eq!(all[0].link, link(2));
        assert_eq!(all[1].link, link(7));

        // Rewritten snapshot is already dense
        let persisted: Vec<Submission> =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("data.json")).unwrap()).unwrap();
        assert_eq!(ids(&persisted), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_unwritable_snapshot_keeps_memory_authoritative() {
        let dir = TempDir::new().unwrap();
        let store = SubmissionStore::open(dir.path().join("missing-dir").join("data.json"));

        let s = store.append(draft(&link(1))).await;
        assert_eq!(s.id, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_appends_never_share_ids() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(open_in(&dir));

        let mut handles = Vec::new();
        for n in 1..=20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                tokio::task::yield_now().await;
                store.append(draft(&link(n))).await.id
            }));
        }

        let mut assigned = Vec::new();
        for handle in handles {
            assigned.push(handle.await.unwrap());
        }
        assigned.sort_unstable();
        assert_eq!(assigned, (1..=20).collect::<Vec<u32>>());
        assert_eq!(ids(&store.all().await), (1..=20).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_interleaved_append_remove_keeps_ids_dense() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir);

        for n in 1..=6 {
            store.append(draft(&link(n))).await;
        }
        store.remove(&link(1)).await.unwrap();
        store.append(draft(&link(7))).await;
        store.remove(&link(4)).await.unwrap();
        store.remove(&link(7)).await.unwrap();
        store.append(draft(&link(8))).await;

        let all = store.all().await;
        assert_eq!(ids(&all), (1..=all.len() as u32).collect::<Vec<u32>>());
        let links: Vec<&str> = all.iter().map(|s| s.link.as_str()).collect();
        assert_eq!(links, vec![link(2), link(3), link(5), link(6), link(8)]);
    }
}
