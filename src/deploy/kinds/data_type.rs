use super::{invalid_key, key_from};
use crate::deploy::adapter::KindAdapter;
use crate::deploy::error::StepError;
use crate::domain::{Artifact, ArtifactKey, DataType, DatabaseType, IdError};
use crate::manifest::DataTypeDefinition;

/// Data types: keyed by name, no cross-references
#[derive(Debug, Default)]
pub struct DataTypeAdapter;

impl KindAdapter for DataTypeAdapter {
    type Definition = DataTypeDefinition;
    type Artifact = DataType;

    fn key(&self, definition: &DataTypeDefinition) -> Result<ArtifactKey, IdError> {
        key_from(&definition.name)
    }

    fn build(&self, definition: &DataTypeDefinition) -> Result<DataType, StepError> {
        let name = self
            .key(definition)
            .map_err(|e| invalid_key::<DataType>(&definition.name, e))?;

        let editor_alias = definition.editor_alias.trim();
        if editor_alias.is_empty() {
            return Err(StepError::validation(
                DataType::KIND,
                &name,
                "property editor alias is empty",
            ));
        }

        let database_type: DatabaseType = definition
            .database_type
            .parse()
            .map_err(|e: String| StepError::validation(DataType::KIND, &name, e))?;

        let mut data_type = DataType::new(name, editor_alias, database_type);
        for pre_value in &definition.pre_values {
            if !data_type.add_pre_value(pre_value.alias.clone(), pre_value.value.clone()) {
                return Err(StepError::validation(
                    DataType::KIND,
                    &data_type.name,
                    format!("pre-value alias '{}' is used more than once", pre_value.alias),
                ));
            }
        }
        Ok(data_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::{DeployError, Deployer, Phase};
    use crate::domain::ArtifactKind;
    use crate::manifest::PreValueDefinition;
    use crate::storage::MemoryStore;

    fn definition(name: &str, pre_values: &[(&str, &str)]) -> DataTypeDefinition {
        DataTypeDefinition {
            name: name.to_string(),
            editor_alias: "Umbraco.Textbox".to_string(),
            database_type: "Nvarchar".to_string(),
            pre_values: pre_values
                .iter()
                .map(|(alias, value)| PreValueDefinition {
                    alias: alias.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn builds_editor_database_type_and_pre_values() {
        let built = DataTypeAdapter
            .build(&definition("Short Text", &[("maxChars", "10"), ("rows", "1")]))
            .unwrap();

        assert_eq!(built.editor_alias, "Umbraco.Textbox");
        assert_eq!(built.database_type, DatabaseType::Nvarchar);
        assert_eq!(built.pre_values.len(), 2);
    }

    #[test]
    fn empty_editor_alias_is_rejected() {
        let mut def = definition("Short Text", &[]);
        def.editor_alias = "  ".to_string();

        assert!(matches!(
            DataTypeAdapter.build(&def),
            Err(StepError::Validation { .. })
        ));
    }

    #[test]
    fn repeated_pre_value_alias_rolls_back_batch() {
        let store = MemoryStore::new();
        let batch = [
            definition("Textstring", &[]),
            definition("Short Text", &[("maxChars", "10"), ("maxChars", "500")]),
        ];

        let err = Deployer::new(&store, DataTypeAdapter).deploy(&batch).unwrap_err();

        match err {
            DeployError::Aborted {
                phase: Phase::Create,
                cause: StepError::Validation { key, message, .. },
                ..
            } => {
                assert_eq!(key, "Short Text");
                assert!(message.contains("'maxChars'"));
            }
            other => panic!("expected create-phase validation abort, got {other}"),
        }
        assert_eq!(store.len_of(ArtifactKind::DataType), 0);
    }
}
