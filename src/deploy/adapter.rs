//! Per-kind adapter seam
//!
//! The deployer runs the same protocol for every artifact kind. What
//! differs per kind (key extraction, building the artifact from its
//! definition, assigning cross-references and checking the linked batch)
//! lives behind [`KindAdapter`]. Create, update, delete and lookup come from
//! the store's [`ArtifactStore`](crate::storage::ArtifactStore) impl for the
//! adapter's artifact type.

use serde::Serialize;
use tracing::warn;

use super::error::StepError;
use super::resolver::{Resolution, ResolvedRef};
use crate::domain::{Artifact, ArtifactKey, ArtifactKind, IdError};

pub trait KindAdapter {
    type Definition;
    type Artifact: Artifact;

    /// Key the definition will be stored under
    fn key(&self, definition: &Self::Definition) -> Result<ArtifactKey, IdError>;

    /// Builds the artifact from its direct fields
    fn build(&self, definition: &Self::Definition) -> Result<Self::Artifact, StepError>;

    /// Resolves and assigns cross-references on a created artifact
    ///
    /// Returns true if the artifact changed and must be persisted.
    fn link(
        &self,
        _definition: &Self::Definition,
        _artifact: &mut Self::Artifact,
        _links: &mut LinkContext,
    ) -> Result<bool, StepError> {
        Ok(false)
    }

    /// Checks the linked batch as a whole, before any update is persisted
    fn verify(&self, _linked: &[Self::Artifact]) -> Result<(), StepError> {
        Ok(())
    }
}

/// A reference that did not resolve and was left out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedReference {
    pub owner: ArtifactKey,
    pub field: &'static str,
    pub identifier: String,
}

/// Collects dropped references during the link phase
#[derive(Debug, Default)]
pub struct LinkContext {
    strict: bool,
    dropped: Vec<DroppedReference>,
}

impl LinkContext {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            dropped: Vec::new(),
        }
    }

    /// Accepts a resolution for `owner.field`, returning what resolved
    ///
    /// In strict mode any drop fails the step instead.
    pub fn accept(
        &mut self,
        kind: ArtifactKind,
        owner: &ArtifactKey,
        field: &'static str,
        resolution: Resolution,
    ) -> Result<Vec<ResolvedRef>, StepError> {
        if resolution.is_complete() {
            return Ok(resolution.resolved);
        }

        if self.strict {
            return Err(StepError::UnresolvedReference {
                kind,
                owner: owner.clone(),
                field,
                identifiers: resolution.dropped,
            });
        }

        for identifier in resolution.dropped {
            warn!(%kind, owner = %owner, field, identifier = %identifier, "dropping unresolved reference");
            self.dropped.push(DroppedReference {
                owner: owner.clone(),
                field,
                identifier,
            });
        }
        Ok(resolution.resolved)
    }

    pub fn dropped(&self) -> &[DroppedReference] {
        &self.dropped
    }

    pub fn into_dropped(self) -> Vec<DroppedReference> {
        self.dropped
    }
}
