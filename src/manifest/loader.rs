//! Manifest loading
//!
//! A manifest is a YAML, JSON or TOML document with one optional section per
//! artifact kind. JSON is read by the YAML parser, which accepts it as-is.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::definition::{
    ContentTypeDefinition, DataTypeDefinition, MacroDefinition, PartialViewDefinition,
    ScriptDefinition, StylesheetDefinition, TemplateDefinition,
};
use crate::domain::ArtifactKind;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} manifest: {message}")]
    Parse {
        format: ManifestFormat,
        message: String,
    },
}

/// Document format of a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Json,
    Toml,
}

impl ManifestFormat {
    /// Picks the format from a file extension, defaulting to YAML
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("toml") => ManifestFormat::Toml,
            Some("json") => ManifestFormat::Json,
            _ => ManifestFormat::Yaml,
        }
    }
}

impl std::fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ManifestFormat::Yaml => "YAML",
            ManifestFormat::Json => "JSON",
            ManifestFormat::Toml => "TOML",
        };
        f.write_str(s)
    }
}

/// All artifact definitions of one document, grouped by kind
///
/// Sections appear in the order batches are deployed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default, deny_unknown_fields)]
pub struct Manifest {
    pub data_types: Vec<DataTypeDefinition>,
    pub templates: Vec<TemplateDefinition>,
    pub content_types: Vec<ContentTypeDefinition>,
    pub macros: Vec<MacroDefinition>,
    pub scripts: Vec<ScriptDefinition>,
    pub stylesheets: Vec<StylesheetDefinition>,
    pub partial_views: Vec<PartialViewDefinition>,
}

impl Manifest {
    /// Loads a manifest from disk
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, ManifestFormat::from_path(path))
    }

    /// Parses a manifest from text
    pub fn parse(content: &str, format: ManifestFormat) -> Result<Self, ManifestError> {
        // An empty YAML document parses as null rather than an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let parse_error = |message: String| ManifestError::Parse { format, message };

        match format {
            ManifestFormat::Yaml | ManifestFormat::Json => {
                serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))
            }
            ManifestFormat::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
        }
    }

    /// Number of definitions for `kind`
    pub fn count(&self, kind: ArtifactKind) -> usize {
        match kind {
            ArtifactKind::DataType => self.data_types.len(),
            ArtifactKind::Template => self.templates.len(),
            ArtifactKind::ContentType => self.content_types.len(),
            ArtifactKind::Macro => self.macros.len(),
            ArtifactKind::Script => self.scripts.len(),
            ArtifactKind::Stylesheet => self.stylesheets.len(),
            ArtifactKind::PartialView => self.partial_views.len(),
        }
    }

    /// Kinds with at least one definition, in deployment order
    pub fn kinds(&self) -> Vec<ArtifactKind> {
        ArtifactKind::ALL
            .into_iter()
            .filter(|k| self.count(*k) > 0)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }
}
