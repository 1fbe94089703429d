//! Moderation channel messages

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ModerationMessage {
    #[serde(default)]
    pub community_id: Option<String>,
    pub author_id: String,
    #[serde(default)]
    pub author_is_bot: bool,
    pub content: String,
}

/// `reply` is null when the message warrants no answer
#[derive(Debug, Serialize)]
pub struct ModerationReply {
    pub reply: Option<String>,
}

/// POST /api/moderation/messages
pub async fn moderation_message(
    State(state): State<AppState>,
    Json(message): Json<ModerationMessage>,
) -> Json<ModerationReply> {
    if !state.community.admits(message.community_id.as_deref()) {
        debug!(community = ?message.community_id, "Ignoring message from foreign community");
        return Json(ModerationReply { reply: None });
    }

    let reply = state
        .engine
        .handle_moderation_message(&message.author_id, message.author_is_bot, &message.content)
        .await;
    Json(ModerationReply { reply })
}
