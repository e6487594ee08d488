//! Store adapter boundary
//!
//! The backing CMS is reached only through [`ArtifactStore`], one
//! capability set per artifact kind. Implementations do plain I/O and make
//! no deployment decisions.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::domain::{
    Artifact, ArtifactId, ArtifactKey, ArtifactKind, ContentType, DataType, Macro, PartialView,
    Script, Stylesheet, Template,
};

/// Store operation, used in errors and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Lookup,
    ListKeys,
    Create,
    Update,
    Delete,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StoreOperation::Lookup => "lookup",
            StoreOperation::ListKeys => "list",
            StoreOperation::Create => "create",
            StoreOperation::Update => "update",
            StoreOperation::Delete => "delete",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("{kind} '{key}' already exists")]
    AlreadyExists { kind: ArtifactKind, key: ArtifactKey },

    #[error("{kind} '{key}' not found")]
    NotFound { kind: ArtifactKind, key: ArtifactKey },

    #[error("Store rejected {operation} of {kind} '{key}': {reason}")]
    Rejected {
        operation: StoreOperation,
        kind: ArtifactKind,
        key: String,
        reason: String,
    },

    #[error("Store I/O failed: {0}")]
    Io(String),

    #[error("Corrupt store data: {0}")]
    Corrupt(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(e: anyhow::Error) -> Self {
        StoreError::Io(format!("{:#}", e))
    }
}

/// Capability set of the backing store for one artifact kind
pub trait ArtifactStore<A: Artifact> {
    /// Looks up an artifact by its key
    fn find_by_key(&self, key: &ArtifactKey) -> Result<Option<A>, StoreError>;

    /// Persists a new artifact, assigning its ID
    fn create(&self, artifact: A) -> Result<A, StoreError>;

    /// Persists changes to an existing artifact
    fn update(&self, artifact: &A) -> Result<A, StoreError>;

    /// Removes an artifact
    fn delete(&self, artifact: &A) -> Result<(), StoreError>;

    /// Returns the keys of every stored artifact of this kind
    fn list_keys(&self) -> Result<BTreeSet<ArtifactKey>, StoreError>;

    /// Returns every stored artifact of this kind, in creation order
    fn list_all(&self) -> Result<Vec<A>, StoreError>;
}

/// A store supporting all seven artifact kinds
pub trait SchemaStore:
    ArtifactStore<ContentType>
    + ArtifactStore<DataType>
    + ArtifactStore<Template>
    + ArtifactStore<Macro>
    + ArtifactStore<Script>
    + ArtifactStore<Stylesheet>
    + ArtifactStore<PartialView>
{
}

impl<S> SchemaStore for S where
    S: ArtifactStore<ContentType>
        + ArtifactStore<DataType>
        + ArtifactStore<Template>
        + ArtifactStore<Macro>
        + ArtifactStore<Script>
        + ArtifactStore<Stylesheet>
        + ArtifactStore<PartialView>
{
}

/// Assigns a fresh ID (unique among `taken`) and creation timestamps
pub(crate) fn assign_new_id<A: Artifact>(
    artifact: &mut A,
    now: DateTime<Utc>,
    taken: impl Fn(&ArtifactId) -> bool,
) {
    let mut stamp = now;
    let mut id = ArtifactId::generate(A::KIND, artifact.key(), stamp);
    while taken(&id) {
        stamp += Duration::nanoseconds(1);
        id = ArtifactId::generate(A::KIND, artifact.key(), stamp);
    }
    artifact.meta_mut().assign(id, now);
}
