//! File-backed kinds: scripts, stylesheets and partial views
//!
//! None of them carry references, so only key and build apply.

use super::{invalid_key, key_from};
use crate::deploy::adapter::KindAdapter;
use crate::deploy::error::StepError;
use crate::domain::{ArtifactKey, IdError, PartialView, Script, Stylesheet};
use crate::manifest::{PartialViewDefinition, ScriptDefinition, StylesheetDefinition};

#[derive(Debug, Default)]
pub struct ScriptAdapter;

impl KindAdapter for ScriptAdapter {
    type Definition = ScriptDefinition;
    type Artifact = Script;

    fn key(&self, definition: &ScriptDefinition) -> Result<ArtifactKey, IdError> {
        key_from(&definition.name)
    }

    fn build(&self, definition: &ScriptDefinition) -> Result<Script, StepError> {
        let name = self
            .key(definition)
            .map_err(|e| invalid_key::<Script>(&definition.name, e))?;
        Ok(Script::new(name, definition.content.clone()))
    }
}

#[derive(Debug, Default)]
pub struct StylesheetAdapter;

impl KindAdapter for StylesheetAdapter {
    type Definition = StylesheetDefinition;
    type Artifact = Stylesheet;

    fn key(&self, definition: &StylesheetDefinition) -> Result<ArtifactKey, IdError> {
        key_from(&definition.name)
    }

    fn build(&self, definition: &StylesheetDefinition) -> Result<Stylesheet, StepError> {
        let name = self
            .key(definition)
            .map_err(|e| invalid_key::<Stylesheet>(&definition.name, e))?;
        Ok(Stylesheet::new(name, definition.content.clone()))
    }
}

#[derive(Debug, Default)]
pub struct PartialViewAdapter;

impl KindAdapter for PartialViewAdapter {
    type Definition = PartialViewDefinition;
    type Artifact = PartialView;

    fn key(&self, definition: &PartialViewDefinition) -> Result<ArtifactKey, IdError> {
        key_from(&definition.path)
    }

    fn build(&self, definition: &PartialViewDefinition) -> Result<PartialView, StepError> {
        let path = self
            .key(definition)
            .map_err(|e| invalid_key::<PartialView>(&definition.path, e))?;
        Ok(PartialView::new(
            path,
            definition.content.clone(),
            definition.is_macro_partial,
        ))
    }
}
