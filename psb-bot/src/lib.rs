//! psb-bot library - private server board
//!
//! Collects private-server share links from community members, classifies
//! them against the game platform, lets one moderator override the result,
//! and keeps a single published summary of the board in sync.

use axum::Router;
use psb_common::EventBus;
use std::sync::Arc;

pub mod api;
pub mod artifact;
pub mod config;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod moderation;
pub mod startup;
pub mod store;
pub mod summary;
pub mod surface;
pub mod validator;

pub use api::CommunityGate;
pub use engine::LifecycleEngine;
pub use error::{Error, Result};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LifecycleEngine>,
    pub summary: Arc<summary::SummarySynchronizer>,
    pub intake: Arc<artifact::IntakeFormKeeper>,
    pub events: Arc<EventBus>,
    pub community: CommunityGate,
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/api/intake/form", get(api::get_intake_form))
        .route("/api/intake/submissions", post(api::submit))
        .route("/api/moderation/messages", post(api::moderation_message))
        .route("/api/display/deleted", post(api::artifact_deleted))
        .route("/api/submissions", get(api::list_submissions))
        .route("/api/summary", get(api::get_summary))
        .route("/api/events", get(api::event_stream))
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
