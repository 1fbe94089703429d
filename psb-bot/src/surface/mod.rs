//! Display surfaces
//!
//! A surface hosts published artifacts (the intake form, the summary) on
//! some external medium. Artifacts may disappear at any time without this
//! process noticing; slots detect that through failed edits or deletion
//! notices.

use crate::artifact::{ArtifactContent, ArtifactId, ArtifactKind};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod webhook;

pub use memory::MemorySurface;
pub use webhook::{ArtifactLedger, WebhookSurface};

#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The artifact no longer exists
    #[error("artifact {0} is gone")]
    Gone(ArtifactId),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("surface rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("could not decode surface response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait DisplaySurface: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// An artifact of `kind` previously authored by this system, if one
    /// still exists
    async fn find_authored(&self, kind: ArtifactKind) -> Result<Option<ArtifactId>, SurfaceError>;

    async fn publish(
        &self,
        kind: ArtifactKind,
        content: &ArtifactContent,
    ) -> Result<ArtifactId, SurfaceError>;

    async fn edit(&self, id: &ArtifactId, content: &ArtifactContent) -> Result<(), SurfaceError>;

    async fn pin(&self, id: &ArtifactId) -> Result<(), SurfaceError>;
}
