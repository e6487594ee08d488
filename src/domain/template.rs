//! Template domain model

use serde::{Deserialize, Serialize};

use super::artifact::{Artifact, StoreMeta};
use super::id::{ArtifactId, ArtifactKey, ArtifactKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(flatten)]
    pub meta: StoreMeta,

    pub name: String,

    pub alias: ArtifactKey,

    #[serde(default)]
    pub content: String,

    /// Layout this template inherits from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_template: Option<ArtifactId>,
}

impl Template {
    pub fn new(name: impl Into<String>, alias: ArtifactKey, content: impl Into<String>) -> Self {
        Self {
            meta: StoreMeta::default(),
            name: name.into(),
            alias,
            content: content.into(),
            master_template: None,
        }
    }
}

impl Artifact for Template {
    const KIND: ArtifactKind = ArtifactKind::Template;

    fn key(&self) -> &ArtifactKey {
        &self.alias
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut StoreMeta {
        &mut self.meta
    }
}
