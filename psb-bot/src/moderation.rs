//! Moderator text commands
//!
//! Commands take the shape `<verb> <link>`, e.g. `approve
//! https://www.roblox.com/share?code=ABC`. The verb is case-insensitive.

use psb_common::{Submission, SubmissionStatus};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationVerb {
    Approve,
    Reject,
    Delete,
}

impl ModerationVerb {
    pub fn parse(verb: &str) -> Option<Self> {
        match verb.to_ascii_lowercase().as_str() {
            "approve" => Some(ModerationVerb::Approve),
            "reject" => Some(ModerationVerb::Reject),
            "delete" => Some(ModerationVerb::Delete),
            _ => None,
        }
    }

    /// Status an approve/reject sets; `None` for delete
    pub fn target_status(&self) -> Option<SubmissionStatus> {
        match self {
            ModerationVerb::Approve => Some(SubmissionStatus::Verified),
            ModerationVerb::Reject => Some(SubmissionStatus::Rejected),
            ModerationVerb::Delete => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationCommand {
    pub verb: ModerationVerb,
    pub link: String,
}

fn command_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\w+)\s+(.+)$").expect("static pattern"))
}

impl ModerationCommand {
    /// Parse a chat message. Anything that is not a known verb followed by
    /// a link yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let captures = command_pattern().captures(text.trim())?;
        let verb = ModerationVerb::parse(&captures[1])?;
        let link = captures[2].trim();
        if link.is_empty() {
            return None;
        }
        Some(Self {
            verb,
            link: link.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModerationError {
    #[error("only the configured moderator may issue commands")]
    NotAuthorized,

    #[error("Link not found in submissions.")]
    NotFound { link: String },
}

/// Successful command result
#[derive(Debug, Clone, PartialEq)]
pub enum ModerationOutcome {
    StatusChanged {
        previous: SubmissionStatus,
        submission: Submission,
    },
    Removed {
        submission: Submission,
    },
}

impl ModerationOutcome {
    pub fn reply_text(&self) -> String {
        match self {
            ModerationOutcome::StatusChanged { submission, .. } => match submission.status {
                SubmissionStatus::Rejected => format!("Rejected submission: {}", submission.link),
                _ => format!("Approved submission: {}", submission.link),
            },
            ModerationOutcome::Removed { submission } => {
                format!("Deleted submission: {}", submission.link)
            }
        }
    }
}
