//! Artifact definitions as written in a manifest
//!
//! Field names are PascalCase to match the documents the CMS tooling
//! exchanges. Definitions are plain data: keys, references and enum-like
//! strings are interpreted by the deployer, not here.

use serde::{Deserialize, Serialize};

/// A content type record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ContentTypeDefinition {
    pub name: String,

    pub alias: String,

    #[serde(default)]
    pub allowed_as_root: bool,

    /// Template aliases; each entry may itself be a comma-separated list
    #[serde(default)]
    pub allowed_templates: Vec<String>,

    #[serde(default)]
    pub thumbnail: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,

    #[serde(default)]
    pub default_template: Option<String>,

    /// Comma-separated content type aliases allowed as children
    #[serde(default)]
    pub allowed_content_types: String,

    /// Comma-separated content type aliases this type is composed of
    #[serde(default)]
    pub content_type_composition: String,
}

/// A property of a content type record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct PropertyDefinition {
    pub name: String,

    pub alias: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub mandatory: bool,

    /// Name of the data type backing the property
    #[serde(rename = "Type")]
    pub data_type: String,

    #[serde(default = "default_group")]
    pub group: String,
}

fn default_group() -> String {
    "Content".to_string()
}

/// A data type record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct DataTypeDefinition {
    pub name: String,

    /// Property editor alias
    #[serde(rename = "Type")]
    pub editor_alias: String,

    #[serde(default = "default_database_type")]
    pub database_type: String,

    #[serde(default)]
    pub pre_values: Vec<PreValueDefinition>,
}

fn default_database_type() -> String {
    "Nvarchar".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct PreValueDefinition {
    pub alias: String,
    pub value: String,
}

/// A template record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TemplateDefinition {
    pub name: String,

    pub alias: String,

    #[serde(default)]
    pub content: String,

    /// Alias of the layout template; older documents spell it `MaterTemplateAlias`
    #[serde(default, alias = "MaterTemplateAlias")]
    pub master_template_alias: Option<String>,
}

/// A macro record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct MacroDefinition {
    pub name: String,

    pub alias: String,

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

    #[serde(default)]
    pub cache_duration: u32,

    #[serde(default)]
    pub properties: Vec<MacroPropertyDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct MacroPropertyDefinition {
    pub name: String,

    pub alias: String,

    /// Data type name or property editor alias
    #[serde(rename = "Type")]
    pub editor: String,
}

/// A script record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ScriptDefinition {
    pub name: String,

    #[serde(default)]
    pub content: String,
}

/// A stylesheet record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct StylesheetDefinition {
    pub name: String,

    #[serde(default)]
    pub content: String,
}

/// A partial view record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct PartialViewDefinition {
    pub path: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub is_macro_partial: bool,
}
