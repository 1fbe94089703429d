//! Submission record shared by the board services
//!
//! The JSON field names match the snapshot file format, so snapshots written
//! by earlier deployments load unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Username value stored when the submitter left the field empty
pub const USERNAME_NOT_PROVIDED: &str = "not provided";

/// Validity classification of a submission
///
/// The verifier assigns the initial value; afterwards only moderator
/// commands change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[serde(alias = "✅ Verified Jailbreak private server")]
    Verified,
    #[serde(alias = "❌ Wrong game")]
    WrongGame,
    #[serde(alias = "⏳ Pending Verification")]
    PendingVerification,
    #[serde(alias = "❌ Rejected")]
    Rejected,
}

impl SubmissionStatus {
    /// Human-readable label shown on the board
    pub fn label(&self, game_name: &str) -> String {
        match self {
            SubmissionStatus::Verified => format!("✅ Verified {} private server", game_name),
            SubmissionStatus::WrongGame => "❌ Wrong game".to_string(),
            SubmissionStatus::PendingVerification => "⏳ Pending Verification".to_string(),
            SubmissionStatus::Rejected => "❌ Rejected".to_string(),
        }
    }

    /// Stable machine-readable name (matches the serialized form)
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Verified => "verified",
            SubmissionStatus::WrongGame => "wrong_game",
            SubmissionStatus::PendingVerification => "pending_verification",
            SubmissionStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted share link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Dense 1..N position on the board
    pub id: u32,

    /// Chat-platform identity of the submitter
    #[serde(rename = "userId")]
    pub submitter_id: String,

    /// Free-text game username, or [`USERNAME_NOT_PROVIDED`]
    #[serde(rename = "robloxUsername")]
    pub external_username: String,

    /// Resolved numeric game account id, looked up once at creation
    #[serde(rename = "robloxUserID", default)]
    pub external_user_id: Option<u64>,

    /// Canonical share link; moderator commands address submissions by it
    pub link: String,

    pub status: SubmissionStatus,

    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// True when the submitter supplied a username
    pub fn has_username(&self) -> bool {
        self.external_username != USERNAME_NOT_PROVIDED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&SubmissionStatus::WrongGame).unwrap();
        assert_eq!(json, "\"wrong_game\"");
    }

    #[test]
    fn test_status_accepts_legacy_labels() {
        let status: SubmissionStatus = serde_json::from_str("\"⏳ Pending Verification\"").unwrap();
        assert_eq!(status, SubmissionStatus::PendingVerification);

        let status: SubmissionStatus =
            serde_json::from_str("\"✅ Verified Jailbreak private server\"").unwrap();
        assert_eq!(status, SubmissionStatus::Verified);
    }

    #[test]
    fn test_labels_use_game_name() {
        assert_eq!(
            SubmissionStatus::Verified.label("Jailbreak"),
            "✅ Verified Jailbreak private server"
        );
        assert_eq!(SubmissionStatus::Rejected.label("Jailbreak"), "❌ Rejected");
    }

    #[test]
    fn test_submission_snapshot_field_names() {
        let raw = r#"{
            "id": 3,
            "userId": "42",
            "robloxUsername": "builderman",
            "robloxUserID": 156,
            "link": "https://www.roblox.com/share?code=ABC",
            "status": "❌ Rejected",
            "timestamp": "2025-09-16T12:00:00.000Z"
        }"#;

        let submission: Submission = serde_json::from_str(raw).unwrap();
        assert_eq!(submission.id, 3);
        assert_eq!(submission.submitter_id, "42");
        assert_eq!(submission.external_user_id, Some(156));
        assert_eq!(submission.status, SubmissionStatus::Rejected);
        assert!(submission.has_username());
    }

    #[test]
    fn test_missing_user_id_defaults_to_none() {
        let raw = r#"{
            "id": 1,
            "userId": "42",
            "robloxUsername": "not provided",
            "link": "https://www.roblox.com/share?code=ABC",
            "status": "pending_verification",
            "timestamp": "2025-09-16T12:00:00Z"
        }"#;

        let submission: Submission = serde_json::from_str(raw).unwrap();
        assert_eq!(submission.external_user_id, None);
        assert!(!submission.has_username());
    }
}
