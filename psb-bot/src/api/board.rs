//! Read-only board views and the event stream

use axum::{
    extract::State,
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::Stream;
use psb_common::Submission;
use serde::Serialize;
use std::convert::Infallible;

use crate::summary::SummaryView;
use crate::AppState;

/// GET /api/submissions
pub async fn list_submissions(State(state): State<AppState>) -> Json<Vec<Submission>> {
    Json(state.engine.store().all().await)
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// Id of the published summary, if one is live
    pub artifact_id: Option<String>,
    pub summary: SummaryView,
}

/// GET /api/summary
///
/// Rendered from the store on each request, so it is current even while
/// the published artifact is being recreated.
pub async fn get_summary(State(state): State<AppState>) -> Json<SummaryResponse> {
    let submissions = state.engine.store().all().await;
    let summary = state
        .summary
        .renderer()
        .render(&submissions, psb_common::time::now());

    Json(SummaryResponse {
        artifact_id: state.summary.current().await.map(|id| id.0),
        summary,
    })
}

/// GET /api/events
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    psb_common::sse::board_event_stream("psb-bot", state.events.subscribe())
}
