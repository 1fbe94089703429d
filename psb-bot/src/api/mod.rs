//! HTTP adapter for the chat-platform bridge
//!
//! The bridge forwards intake submissions, moderation-channel messages and
//! message-deletion notices here, and reads the board back out.

pub mod board;
pub mod display;
pub mod health;
pub mod intake;
pub mod moderation;

pub use board::{event_stream, get_summary, list_submissions};
pub use display::artifact_deleted;
pub use health::health_routes;
pub use intake::{get_intake_form, submit};
pub use moderation::moderation_message;

/// Restricts events to the configured community
#[derive(Debug, Clone)]
pub struct CommunityGate {
    community_id: Option<String>,
    community_name: String,
}

impl CommunityGate {
    /// `None` admits every community
    pub fn new(community_id: Option<String>, community_name: &str) -> Self {
        Self {
            community_id,
            community_name: community_name.to_string(),
        }
    }

    /// Events without a community (direct messages) are refused once a
    /// community is configured
    pub fn admits(&self, community_id: Option<&str>) -> bool {
        match &self.community_id {
            Some(expected) => community_id == Some(expected.as_str()),
            None => true,
        }
    }

    pub fn refusal_message(&self) -> String {
        format!("This bot is private to {}.", self.community_name)
    }
}
