//! File-backed artifacts: scripts, stylesheets and partial views
//!
//! These carry only a name/path and a content body and never reference
//! other artifacts.

use serde::{Deserialize, Serialize};

use super::artifact::{Artifact, StoreMeta};
use super::id::{ArtifactKey, ArtifactKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(flatten)]
    pub meta: StoreMeta,

    pub name: ArtifactKey,

    #[serde(default)]
    pub content: String,
}

impl Script {
    pub fn new(name: ArtifactKey, content: impl Into<String>) -> Self {
        Self {
            meta: StoreMeta::default(),
            name,
            content: content.into(),
        }
    }
}

impl Artifact for Script {
    const KIND: ArtifactKind = ArtifactKind::Script;

    fn key(&self) -> &ArtifactKey {
        &self.name
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut StoreMeta {
        &mut self.meta
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stylesheet {
    #[serde(flatten)]
    pub meta: StoreMeta,

    pub name: ArtifactKey,

    #[serde(default)]
    pub content: String,
}

impl Stylesheet {
    pub fn new(name: ArtifactKey, content: impl Into<String>) -> Self {
        Self {
            meta: StoreMeta::default(),
            name,
            content: content.into(),
        }
    }
}

impl Artifact for Stylesheet {
    const KIND: ArtifactKind = ArtifactKind::Stylesheet;

    fn key(&self) -> &ArtifactKey {
        &self.name
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut StoreMeta {
        &mut self.meta
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialView {
    #[serde(flatten)]
    pub meta: StoreMeta,

    pub path: ArtifactKey,

    #[serde(default)]
    pub content: String,

    /// Macro partials are rendered through a macro rather than directly
    #[serde(default)]
    pub is_macro_partial: bool,
}

impl PartialView {
    pub fn new(path: ArtifactKey, content: impl Into<String>, is_macro_partial: bool) -> Self {
        Self {
            meta: StoreMeta::default(),
            path,
            content: content.into(),
            is_macro_partial,
        }
    }
}

impl Artifact for PartialView {
    const KIND: ArtifactKind = ArtifactKind::PartialView;

    fn key(&self) -> &ArtifactKey {
        &self.path
    }

    fn name(&self) -> &str {
        self.path.as_str()
    }

    fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut StoreMeta {
        &mut self.meta
    }
}
