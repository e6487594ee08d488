//! Data type domain model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::artifact::{Artifact, StoreMeta};
use super::id::{ArtifactKey, ArtifactKind};

/// Column type used to persist values of a data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseType {
    Integer,
    Date,
    #[default]
    Nvarchar,
    Ntext,
    Decimal,
}

impl DatabaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::Integer => "integer",
            DatabaseType::Date => "date",
            DatabaseType::Nvarchar => "nvarchar",
            DatabaseType::Ntext => "ntext",
            DatabaseType::Decimal => "decimal",
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" => Ok(DatabaseType::Integer),
            "date" => Ok(DatabaseType::Date),
            "nvarchar" => Ok(DatabaseType::Nvarchar),
            "ntext" => Ok(DatabaseType::Ntext),
            "decimal" => Ok(DatabaseType::Decimal),
            other => Err(format!(
                "unknown database type '{}' (expected integer, date, nvarchar, ntext or decimal)",
                other
            )),
        }
    }
}

/// A configured pre-value (editor setting) of a data type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreValue {
    pub alias: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataType {
    #[serde(flatten)]
    pub meta: StoreMeta,

    pub name: ArtifactKey,

    /// Alias of the property editor backing this data type
    pub editor_alias: String,

    #[serde(default)]
    pub database_type: DatabaseType,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_values: Vec<PreValue>,
}

impl DataType {
    pub fn new(name: ArtifactKey, editor_alias: impl Into<String>, database_type: DatabaseType) -> Self {
        Self {
            meta: StoreMeta::default(),
            name,
            editor_alias: editor_alias.into(),
            database_type,
            pre_values: Vec::new(),
        }
    }

    /// Appends a pre-value; returns `false` if the alias is already taken
    pub fn add_pre_value(&mut self, alias: impl Into<String>, value: impl Into<String>) -> bool {
        let alias = alias.into();
        if self.pre_values.iter().any(|p| p.alias == alias) {
            return false;
        }
        self.pre_values.push(PreValue {
            alias,
            value: value.into(),
        });
        true
    }

    /// True if `identifier` names this data type or its editor (case-insensitive)
    pub fn matches_editor(&self, identifier: &str) -> bool {
        let identifier = identifier.trim();
        self.name.as_str().eq_ignore_ascii_case(identifier)
            || self.editor_alias.eq_ignore_ascii_case(identifier)
    }
}

impl Artifact for DataType {
    const KIND: ArtifactKind = ArtifactKind::DataType;

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
