//! Macro domain model
//!
//! Macros are reusable rendering snippets; their parameters are exposed to
//! editors through macro properties backed by property editors.

use serde::{Deserialize, Serialize};

use super::artifact::{Artifact, StoreMeta};
use super::id::{ArtifactKey, ArtifactKind};

/// A parameter of a macro
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroProperty {
    pub name: String,
    pub alias: String,
    pub editor_alias: String,
    pub sort_order: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macro {
    #[serde(flatten)]
    pub meta: StoreMeta,

    pub name: String,

    pub alias: ArtifactKey,

    #[serde(default)]
    pub script_path: String,

    #[serde(default)]
    pub xslt_path: String,

    #[serde(default)]
    pub control_type: String,

    #[serde(default)]
    pub control_assembly: String,

    #[serde(default)]
    pub use_in_editor: bool,

    #[serde(default)]
    pub cache_by_member: bool,

    #[serde(default)]
    pub cache_by_page: bool,

    /// Cache duration in seconds (0 = not cached)
    #[serde(default)]
    pub cache_duration: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<MacroProperty>,
}

impl Macro {
    pub fn new(name: impl Into<String>, alias: ArtifactKey) -> Self {
        Self {
            meta: StoreMeta::default(),
            name: name.into(),
            alias,
            script_path: String::new(),
            xslt_path: String::new(),
            control_type: String::new(),
            control_assembly: String::new(),
            use_in_editor: false,
            cache_by_member: false,
            cache_by_page: false,
            cache_duration: 0,
            properties: Vec::new(),
        }
    }

    /// Appends a property; its sort order is its position
    ///
    /// Returns `false` without appending if the alias is already taken.
    pub fn push_property(
        &mut self,
        name: impl Into<String>,
        alias: impl Into<String>,
        editor_alias: impl Into<String>,
    ) -> bool {
        let alias = alias.into();
        if self.properties.iter().any(|p| p.alias == alias) {
            return false;
        }
        let sort_order = self.properties.len();
        self.properties.push(MacroProperty {
            name: name.into(),
            alias,
            editor_alias: editor_alias.into(),
            sort_order,
        });
        true
    }
}

impl Artifact for Macro {
    const KIND: ArtifactKind = ArtifactKind::Macro;

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
