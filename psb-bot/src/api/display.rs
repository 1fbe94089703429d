//! Deletion notices for published artifacts

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifact::ArtifactId;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DeletionNotice {
    pub message_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeletionResponse {
    /// True when the deleted message was a live artifact and was replaced
    pub recreated: bool,
}

/// POST /api/display/deleted
pub async fn artifact_deleted(
    State(state): State<AppState>,
    Json(notice): Json<DeletionNotice>,
) -> Json<DeletionResponse> {
    let id = ArtifactId(notice.message_id);

    let recreated = state.summary.handle_deleted(&id).await || state.intake.handle_deleted(&id).await;
    if !recreated {
        debug!(id = %id, "Deleted message is not a live artifact");
        state.intake.ensure().await;
    }

    Json(DeletionResponse { recreated })
}
