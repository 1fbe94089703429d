//! Board event types and EventBus
//!
//! Events are broadcast after a mutation has been committed and can be
//! serialized for SSE transmission.

use crate::model::SubmissionStatus;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Board event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BoardEvent {
    /// A new submission was committed to the store
    SubmissionAdded {
        id: u32,
        link: String,
        status: SubmissionStatus,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A moderator approved or rejected a submission
    SubmissionStatusChanged {
        id: u32,
        link: String,
        old_status: SubmissionStatus,
        new_status: SubmissionStatus,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A moderator deleted a submission; remaining ids were compacted
    SubmissionRemoved {
        link: String,
        remaining: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A published artifact vanished and was replaced
    ArtifactRecreated {
        /// "intake_form" or "summary"
        kind: String,
        artifact_id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl BoardEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            BoardEvent::SubmissionAdded { .. } => "SubmissionAdded",
            BoardEvent::SubmissionStatusChanged { .. } => "SubmissionStatusChanged",
            BoardEvent::SubmissionRemoved { .. } => "SubmissionRemoved",
            BoardEvent::ArtifactRecreated { .. } => "ArtifactRecreated",
        }
    }
}

/// Broadcast bus for [`BoardEvent`]s
pub struct EventBus {
    tx: broadcast::Sender<BoardEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: BoardEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
