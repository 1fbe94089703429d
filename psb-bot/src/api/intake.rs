//! Intake form and submissions

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use psb_common::Submission;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::artifact::IntakeForm;
use crate::engine::SubmitRequest;
use crate::AppState;

/// Form values as entered by a community member
#[derive(Debug, Deserialize)]
pub struct SubmissionBody {
    #[serde(default)]
    pub community_id: Option<String>,
    pub submitter_id: String,
    pub share_link: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Reply shown privately to the submitter
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub accepted: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<Submission>,
    /// Set on rejections; true for impersonation attempts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severe: Option<bool>,
}

/// GET /api/intake/form
pub async fn get_intake_form(State(state): State<AppState>) -> Json<IntakeForm> {
    state.intake.ensure().await;
    Json(state.intake.form().clone())
}

/// POST /api/intake/submissions
///
/// 200 with the confirmation, 422 with the rejection reason, or 403 for
/// events from a foreign community.
pub async fn submit(State(state): State<AppState>, Json(body): Json<SubmissionBody>) -> Response {
    if !state.community.admits(body.community_id.as_deref()) {
        info!(community = ?body.community_id, "Refusing submission from foreign community");
        let response = SubmissionResponse {
            accepted: false,
            message: state.community.refusal_message(),
            submission: None,
            severe: None,
        };
        return (StatusCode::FORBIDDEN, Json(response)).into_response();
    }

    state.intake.ensure().await;

    let request = SubmitRequest {
        submitter_id: body.submitter_id,
        share_link: body.share_link,
        username: body.username,
    };

    match state.engine.submit(request).await {
        Ok(receipt) => {
            let response = SubmissionResponse {
                accepted: true,
                message: receipt.message,
                submission: Some(receipt.submission),
                severe: None,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(rejection) => {
            let response = SubmissionResponse {
                accepted: false,
                message: rejection.message,
                submission: None,
                severe: Some(rejection.error.is_severe()),
            };
            (StatusCode::UNPROCESSABLE_ENTITY, Json(response)).into_response()
        }
    }
}
