//! Project management
//!
//! Handles workspace initialization and provides access to the store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::WORKSPACE_DIR;
use super::{Config, FileStore};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a schemadeploy project. Run 'schemadeploy init' first.")]
    NotInProject,
}

const DEFAULT_CONFIG: &str = r#"# schemadeploy configuration

[store]
# Directory holding the artifact store, relative to .schemadeploy/
dir = "store"

[deploy]
# How existing artifacts are detected before a batch is applied:
# "bulk" lists all keys once, "probe" looks each key up individually
conflict_strategy = "bulk"

# Fail (and roll back) when a cross-reference cannot be resolved,
# instead of dropping it
strict_references = false
"#;

/// A schemadeploy project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(WORKSPACE_DIR).is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let workspace = root.join(WORKSPACE_DIR);

        fs::create_dir_all(&workspace).with_context(|| {
            format!("Failed to create {} directory: {}", WORKSPACE_DIR, workspace.display())
        })?;

        // Create default config
        let config_path = workspace.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let project = Self::open(root)?;

        let store_dir = project.config.store_dir()?;
        fs::create_dir_all(&store_dir)
            .with_context(|| format!("Failed to create store directory: {}", store_dir.display()))?;

        Ok(project)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .schemadeploy directory path
    pub fn workspace_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the artifact store
    pub fn store(&self) -> Result<FileStore> {
        Ok(FileStore::new(self.config.store_dir()?))
    }
}
