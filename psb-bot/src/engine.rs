//! Submission lifecycle engine
//!
//! Orchestrates new submissions (validate, verify and resolve concurrently,
//! commit, refresh the summary) and applies moderator commands.
//!
//! The verifier assigns the initial status; after that only the moderator
//! changes it, and verification is never re-run.

use crate::lookup::{IdentityResolver, ShareVerifier};
use crate::moderation::{ModerationCommand, ModerationError, ModerationOutcome, ModerationVerb};
use crate::store::{NewSubmission, StoreError, SubmissionStore};
use crate::summary::SummarySynchronizer;
use crate::validator::{LinkValidator, ValidationError};
use psb_common::model::USERNAME_NOT_PROVIDED;
use psb_common::{BoardEvent, EventBus, Submission};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A submission as delivered by the intake form
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub submitter_id: String,
    pub share_link: String,
    /// Optional game username; blank counts as absent
    pub username: Option<String>,
}

/// A committed submission plus the confirmation shown to the submitter
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub submission: Submission,
    pub message: String,
}

/// A refused submission; nothing was stored
#[derive(Debug, Clone)]
pub struct SubmitRejection {
    pub error: ValidationError,
    pub message: String,
}

/// Collaborators the engine is wired with
pub struct EngineParts {
    pub validator: LinkValidator,
    pub verifier: Arc<dyn ShareVerifier>,
    pub resolver: Arc<dyn IdentityResolver>,
    pub store: Arc<SubmissionStore>,
    pub summary: Arc<SummarySynchronizer>,
    pub events: Arc<EventBus>,
}

pub struct LifecycleEngine {
    validator: LinkValidator,
    verifier: Arc<dyn ShareVerifier>,
    resolver: Arc<dyn IdentityResolver>,
    store: Arc<SubmissionStore>,
    summary: Arc<SummarySynchronizer>,
    events: Arc<EventBus>,
    moderator_id: Option<String>,
    game_name: String,
}

impl LifecycleEngine {
    pub fn new(parts: EngineParts, moderator_id: Option<String>, game_name: &str) -> Self {
        if moderator_id.is_none() {
            warn!("No moderator configured, moderation commands are disabled");
        }

        Self {
            validator: parts.validator,
            verifier: parts.verifier,
            resolver: parts.resolver,
            store: parts.store,
            summary: parts.summary,
            events: parts.events,
            moderator_id,
            game_name: game_name.to_string(),
        }
    }

    pub fn store(&self) -> &Arc<SubmissionStore> {
        &self.store
    }

    pub fn is_moderator(&self, actor_id: &str) -> bool {
        self.moderator_id.as_deref() == Some(actor_id)
    }

    /// Validate, classify and commit a new submission.
    ///
    /// The id is allocated by the store only after both lookups have
    /// finished, so concurrent submissions never share an id.
    pub async fn submit(&self, request: SubmitRequest) -> Result<SubmitReceipt, SubmitRejection> {
        let validated = match self.validator.validate(&request.share_link) {
            Ok(validated) => validated,
            Err(error) => {
                if error.is_severe() {
                    warn!(
                        submitter = %request.submitter_id,
                        link = %request.share_link,
                        reason = %error,
                        "Malicious link submitted"
                    );
                } else {
                    info!(submitter = %request.submitter_id, reason = %error, "Submission rejected");
                }
                return Err(SubmitRejection {
                    message: error.user_message(&self.game_name),
                    error,
                });
            }
        };

        let username = request
            .username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let resolve = async {
            match &username {
                Some(name) => self.resolver.resolve(name).await,
                None => None,
            }
        };
        let (status, external_user_id) =
            tokio::join!(self.verifier.verify(&validated.code), resolve);

        let submission = self
            .store
            .append(NewSubmission {
                submitter_id: request.submitter_id,
                external_username: username.unwrap_or_else(|| USERNAME_NOT_PROVIDED.to_string()),
                external_user_id,
                link: validated.canonical_link,
                status,
                created_at: psb_common::time::now(),
            })
            .await;

        info!(id = submission.id, link = %submission.link, status = %submission.status, "Submission added");
        self.events.emit_lossy(BoardEvent::SubmissionAdded {
            id: submission.id,
            link: submission.link.clone(),
            status: submission.status,
            timestamp: submission.created_at,
        });

        self.summary.refresh().await;

        Ok(SubmitReceipt {
            message: self.confirmation_text(&submission),
            submission,
        })
    }

    fn confirmation_text(&self, submission: &Submission) -> String {
        format!(
            "Thanks — Private server added ✅\nSubmitted by: <@{}>\nRoblox Username: {}\nLink: {}\nStatus: {}",
            submission.submitter_id,
            submission.external_username,
            submission.link,
            submission.status.label(&self.game_name)
        )
    }

    /// Apply a moderator command to the submission with exactly `link`
    pub async fn apply_command(
        &self,
        actor_id: &str,
        verb: ModerationVerb,
        link: &str,
    ) -> Result<ModerationOutcome, ModerationError> {
        if !self.is_moderator(actor_id) {
            debug!(actor = %actor_id, "Ignoring command from non-moderator");
            return Err(ModerationError::NotAuthorized);
        }

        let not_found = |StoreError::NotFound { link }| ModerationError::NotFound { link };

        let outcome = match verb.target_status() {
            Some(status) => {
                let (previous, submission) =
                    self.store.set_status(link, status).await.map_err(not_found)?;
                info!(id = submission.id, link = %link, from = %previous, to = %status, "Status overridden");
                self.events.emit_lossy(BoardEvent::SubmissionStatusChanged {
                    id: submission.id,
                    link: submission.link.clone(),
                    old_status: previous,
                    new_status: status,
                    timestamp: psb_common::time::now(),
                });
                ModerationOutcome::StatusChanged {
                    previous,
                    submission,
                }
            }
            None => {
                let (submission, remaining) = self.store.remove(link).await.map_err(not_found)?;
                info!(link = %link, remaining, "Submission deleted");
                self.events.emit_lossy(BoardEvent::SubmissionRemoved {
                    link: submission.link.clone(),
                    remaining,
                    timestamp: psb_common::time::now(),
                });
                ModerationOutcome::Removed { submission }
            }
        };

        self.summary.refresh().await;
        Ok(outcome)
    }

    /// Handle a raw moderation-channel message and produce the reply, if any.
    ///
    /// Bots, non-moderators and text that is not a command get no reply.
    pub async fn handle_moderation_message(
        &self,
        author_id: &str,
        author_is_bot: bool,
        content: &str,
    ) -> Option<String> {
        if author_is_bot || !self.is_moderator(author_id) {
            return None;
        }

        let command = ModerationCommand::parse(content)?;
        match self.apply_command(author_id, command.verb, &command.link).await {
            Ok(outcome) => Some(outcome.reply_text()),
            Err(e @ ModerationError::NotFound { .. }) => Some(e.to_string()),
            Err(ModerationError::NotAuthorized) => None,
        }
    }
}
