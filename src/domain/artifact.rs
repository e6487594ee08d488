//! Common shape of every deployed artifact
//!
//! The store owns `meta`: it assigns the ID and timestamps on create and
//! refreshes `updated_at` on every update. Everything else is set by the
//! deployer from the manifest.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use super::id::{ArtifactId, ArtifactKey, ArtifactKind};

/// Store-managed metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ArtifactId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoreMeta {
    /// Marks the artifact as freshly created
    pub fn assign(&mut self, id: ArtifactId, now: DateTime<Utc>) {
        self.id = Some(id);
        self.created_at = Some(now);
        self.updated_at = Some(now);
    }

    /// Marks the artifact as updated
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

/// A persisted CMS schema artifact
pub trait Artifact: Clone + Debug + Serialize + DeserializeOwned + Send + 'static {
    /// The kind this artifact type belongs to
    const KIND: ArtifactKind;

    /// Unique key within the kind's namespace
    fn key(&self) -> &ArtifactKey;

    /// Display name (falls back to the key for path-addressed kinds)
    fn name(&self) -> &str;

    fn meta(&self) -> &StoreMeta;

    fn meta_mut(&mut self) -> &mut StoreMeta;

    /// The store-assigned ID, if the artifact has been created
    fn id(&self) -> Option<&ArtifactId> {
        self.meta().id.as_ref()
    }
}
