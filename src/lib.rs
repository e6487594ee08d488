//! schemadeploy - Conflict-checked deployment of CMS schema artifacts
//!
//! Reads content types, data types, templates, macros, scripts, stylesheets
//! and partial views from a manifest and deploys each kind as one batch:
//! rejected up front if any key already exists, created and then linked,
//! and rolled back (best effort) if any step fails.

pub mod cli;
pub mod deploy;
pub mod domain;
pub mod manifest;
pub mod storage;

pub use deploy::{DeployError, DeployReport, DeployState, Deployer};
pub use domain::{ArtifactId, ArtifactKey, ArtifactKind};
pub use storage::{ArtifactStore, FileStore, MemoryStore, SchemaStore, StoreError};
