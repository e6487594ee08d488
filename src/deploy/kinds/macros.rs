use super::invalid_key;
use crate::deploy::adapter::KindAdapter;
use crate::deploy::error::StepError;
use crate::domain::{safe_alias, Artifact, ArtifactKey, DataType, IdError, Macro};
use crate::manifest::MacroDefinition;
use crate::storage::ArtifactStore;

/// Macros: keyed by the sanitised alias
///
/// Property types name a data type or a property editor alias and are
/// bound to the editor alias while building.
pub struct MacroAdapter<'s, S> {
    store: &'s S,
}

impl<'s, S> MacroAdapter<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }
}

impl<'s, S> KindAdapter for MacroAdapter<'s, S>
where
    S: ArtifactStore<Macro> + ArtifactStore<DataType>,
{
    type Definition = MacroDefinition;
    type Artifact = Macro;

    fn key(&self, definition: &MacroDefinition) -> Result<ArtifactKey, IdError> {
        ArtifactKey::new(safe_alias(&definition.alias))
    }

    fn build(&self, definition: &MacroDefinition) -> Result<Macro, StepError> {
        let alias = self
            .key(definition)
            .map_err(|e| invalid_key::<Macro>(&definition.alias, e))?;

        let mut item = Macro::new(definition.name.clone(), alias.clone());
        item.script_path = definition.script_path.clone();
        item.xslt_path = definition.xslt_path.clone();
        item.control_type = definition.control_type.clone();
        item.control_assembly = definition.control_assembly.clone();
        item.use_in_editor = definition.use_in_editor;
        item.cache_by_member = definition.cache_by_member;
        item.cache_by_page = definition.cache_by_page;
        item.cache_duration = definition.cache_duration;

        if definition.properties.is_empty() {
            return Ok(item);
        }

        let data_types = ArtifactStore::<DataType>::list_all(self.store)?;
        for property in &definition.properties {
            let property_alias = safe_alias(&property.alias);
            if property_alias.is_empty() {
                return Err(StepError::validation(
                    Macro::KIND,
                    &alias,
                    format!("property '{}' has no usable alias", property.name),
                ));
            }

            let editor = property.editor.trim();
            let data_type = data_types
                .iter()
                .find(|dt| dt.matches_editor(editor))
                .ok_or_else(|| {
                    StepError::validation(
                        Macro::KIND,
                        &alias,
                        format!(
                            "property '{}' uses unknown data type or editor '{}'",
                            property_alias, editor
                        ),
                    )
                })?;

            if !item.push_property(
                property.name.clone(),
                property_alias.clone(),
                data_type.editor_alias.clone(),
            ) {
                return Err(StepError::validation(
                    Macro::KIND,
                    &alias,
                    format!("property alias '{}' is used more than once", property_alias),
                ));
            }
        }

        Ok(item)
    }
}
