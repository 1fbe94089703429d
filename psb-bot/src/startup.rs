//! Service wiring
//!
//! Builds the store, lookups, display surfaces and engine from the loaded
//! configuration. Webhook surfaces are used for each artifact whose URL is
//! configured; the others live on the in-process surface.

use crate::api::CommunityGate;
use crate::artifact::{ArtifactKind, ArtifactSlot, IntakeForm, IntakeFormKeeper};
use crate::config::BotConfig;
use crate::engine::{EngineParts, LifecycleEngine};
use crate::error::Result;
use crate::lookup::{build_http_client, SharePageVerifier, UsernameLookupResolver};
use crate::store::SubmissionStore;
use crate::summary::{SummaryRenderer, SummarySynchronizer};
use crate::surface::{ArtifactLedger, DisplaySurface, MemorySurface, WebhookSurface};
use crate::validator::LinkValidator;
use crate::AppState;
use psb_common::config::RootFolderInitializer;
use psb_common::EventBus;
use std::sync::Arc;
use tracing::info;

/// Wire every component. Nothing is published yet; call
/// [`reconcile_artifacts`] once the state is built.
pub fn build_state(config: &BotConfig, root: &RootFolderInitializer) -> Result<AppState> {
    config.validate()?;
    let events = Arc::new(EventBus::default());

    let snapshot_path = root.snapshot_path(&config.snapshot_file);
    info!(path = %snapshot_path.display(), "Snapshot file");
    let store = Arc::new(SubmissionStore::open(snapshot_path));

    let http_client = build_http_client(config.lookups.timeout())?;
    let verifier = SharePageVerifier::new(
        http_client.clone(),
        &config.lookups.share_page_base,
        &config.game.id,
    )?;
    let resolver = UsernameLookupResolver::new(http_client.clone(), &config.lookups.user_lookup_url)?;

    let memory: Arc<dyn DisplaySurface> = Arc::new(MemorySurface::new());
    let ledger = Arc::new(ArtifactLedger::load(root.artifact_ledger_path()));
    let surface_for = |url: &Option<String>| -> Result<Arc<dyn DisplaySurface>> {
        match url {
            Some(url) => {
                let webhook = WebhookSurface::new(http_client.clone(), url, Arc::clone(&ledger))?;
                let surface: Arc<dyn DisplaySurface> = Arc::new(webhook);
                Ok(surface)
            }
            None => Ok(Arc::clone(&memory)),
        }
    };
    let intake_surface = surface_for(&config.display.intake_webhook_url)?;
    let summary_surface = surface_for(&config.display.summary_webhook_url)?;
    info!(
        intake = intake_surface.name(),
        summary = summary_surface.name(),
        "Display surfaces"
    );

    let summary = Arc::new(SummarySynchronizer::new(
        Arc::clone(&store),
        SummaryRenderer::new(&config.game.name, &config.lookups.profile_url_base),
        ArtifactSlot::new(ArtifactKind::Summary, summary_surface, Arc::clone(&events), true),
    ));
    let intake = Arc::new(IntakeFormKeeper::new(
        ArtifactSlot::new(ArtifactKind::IntakeForm, intake_surface, Arc::clone(&events), false),
        IntakeForm::for_game(&config.game.name, config.display.intake_url.clone()),
    ));

    let engine = LifecycleEngine::new(
        EngineParts {
            validator: LinkValidator::new(&config.links)?,
            verifier: Arc::new(verifier),
            resolver: Arc::new(resolver),
            store,
            summary: Arc::clone(&summary),
            events: Arc::clone(&events),
        },
        config.moderator_id.clone(),
        &config.game.name,
    );

    Ok(AppState {
        engine: Arc::new(engine),
        summary,
        intake,
        events,
        community: CommunityGate::new(config.community_id.clone(), &config.community_name),
    })
}

/// Locate or create the intake form and the summary, then bring the
/// summary up to date
pub async fn reconcile_artifacts(state: &AppState) {
    state.intake.reconcile().await;
    state.summary.reconcile().await;
    info!(
        intake = ?state.intake.current().await.map(|id| id.0),
        summary = ?state.summary.current().await.map(|id| id.0),
        "Artifacts reconciled"
    );
}
