//! Runs manifest sections through the deployer, one kind at a time
//!
//! Each kind is an independent batch. Kinds run in manifest order (data
//! types first, so content types and macros can bind their properties), and
//! a manifest run stops at the first kind that fails. Kinds committed before
//! the failure stay in the store.

use tracing::info;

use super::adapter::KindAdapter;
use super::conflict::ConflictStrategy;
use super::engine::{DeployReport, Deployer};
use super::error::DeployError;
use super::kinds::{
    ContentTypeAdapter, DataTypeAdapter, MacroAdapter, PartialViewAdapter, ScriptAdapter,
    StylesheetAdapter, TemplateAdapter,
};
use super::retract::RetractReport;
use crate::domain::{ArtifactKey, ArtifactKind};
use crate::manifest::Manifest;
use crate::storage::{ArtifactStore, DeployConfig, SchemaStore};

/// Deployer settings taken from project configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployOptions {
    pub conflict_strategy: ConflictStrategy,
    pub strict_references: bool,
}

impl From<&DeployConfig> for DeployOptions {
    fn from(config: &DeployConfig) -> Self {
        Self {
            conflict_strategy: config.conflict_strategy,
            strict_references: config.strict_references,
        }
    }
}

fn deployer<'s, S, K>(store: &'s S, adapter: K, options: &DeployOptions) -> Deployer<'s, S, K>
where
    K: KindAdapter,
    S: ArtifactStore<K::Artifact>,
{
    Deployer::new(store, adapter)
        .with_conflict_strategy(options.conflict_strategy)
        .with_strict_references(options.strict_references)
}

/// Deploys the manifest section for `kind` as one batch
pub fn deploy_kind<S: SchemaStore>(
    store: &S,
    manifest: &Manifest,
    kind: ArtifactKind,
    options: &DeployOptions,
) -> Result<DeployReport, DeployError> {
    match kind {
        ArtifactKind::DataType => {
            deployer(store, DataTypeAdapter, options).deploy(&manifest.data_types)
        }
        ArtifactKind::Template => {
            deployer(store, TemplateAdapter::new(store), options).deploy(&manifest.templates)
        }
        ArtifactKind::ContentType => deployer(store, ContentTypeAdapter::new(store), options)
            .deploy(&manifest.content_types),
        ArtifactKind::Macro => {
            deployer(store, MacroAdapter::new(store), options).deploy(&manifest.macros)
        }
        ArtifactKind::Script => deployer(store, ScriptAdapter, options).deploy(&manifest.scripts),
        ArtifactKind::Stylesheet => {
            deployer(store, StylesheetAdapter, options).deploy(&manifest.stylesheets)
        }
        ArtifactKind::PartialView => {
            deployer(store, PartialViewAdapter, options).deploy(&manifest.partial_views)
        }
    }
}

/// Runs pre-flight for the section of `kind`; returns keys that already exist
pub fn check_kind<S: SchemaStore>(
    store: &S,
    manifest: &Manifest,
    kind: ArtifactKind,
    options: &DeployOptions,
) -> Result<Vec<ArtifactKey>, DeployError> {
    match kind {
        ArtifactKind::DataType => {
            deployer(store, DataTypeAdapter, options).check(&manifest.data_types)
        }
        ArtifactKind::Template => {
            deployer(store, TemplateAdapter::new(store), options).check(&manifest.templates)
        }
        ArtifactKind::ContentType => deployer(store, ContentTypeAdapter::new(store), options)
            .check(&manifest.content_types),
        ArtifactKind::Macro => {
            deployer(store, MacroAdapter::new(store), options).check(&manifest.macros)
        }
        ArtifactKind::Script => deployer(store, ScriptAdapter, options).check(&manifest.scripts),
        ArtifactKind::Stylesheet => {
            deployer(store, StylesheetAdapter, options).check(&manifest.stylesheets)
        }
        ArtifactKind::PartialView => {
            deployer(store, PartialViewAdapter, options).check(&manifest.partial_views)
        }
    }
}

/// Retracts the section of `kind`, best effort
pub fn retract_kind<S: SchemaStore>(
    store: &S,
    manifest: &Manifest,
    kind: ArtifactKind,
) -> Result<RetractReport, DeployError> {
    let options = DeployOptions::default();
    match kind {
        ArtifactKind::DataType => {
            deployer(store, DataTypeAdapter, &options).retract(&manifest.data_types)
        }
        ArtifactKind::Template => {
            deployer(store, TemplateAdapter::new(store), &options).retract(&manifest.templates)
        }
        ArtifactKind::ContentType => deployer(store, ContentTypeAdapter::new(store), &options)
            .retract(&manifest.content_types),
        ArtifactKind::Macro => {
            deployer(store, MacroAdapter::new(store), &options).retract(&manifest.macros)
        }
        ArtifactKind::Script => {
            deployer(store, ScriptAdapter, &options).retract(&manifest.scripts)
        }
        ArtifactKind::Stylesheet => {
            deployer(store, StylesheetAdapter, &options).retract(&manifest.stylesheets)
        }
        ArtifactKind::PartialView => {
            deployer(store, PartialViewAdapter, &options).retract(&manifest.partial_views)
        }
    }
}

/// Kinds of `manifest` to run, in deployment order
///
/// An empty filter selects every kind present.
pub fn selected_kinds(manifest: &Manifest, filter: &[ArtifactKind]) -> Vec<ArtifactKind> {
    manifest
        .kinds()
        .into_iter()
        .filter(|k| filter.is_empty() || filter.contains(k))
        .collect()
}

/// Result of deploying several kinds
#[derive(Debug)]
pub struct ManifestOutcome {
    /// Reports of committed kinds, in the order they ran
    pub committed: Vec<DeployReport>,

    /// The failure that stopped the run, if any
    pub failure: Option<DeployError>,

    /// Kinds that never ran because of the failure
    pub skipped: Vec<ArtifactKind>,
}

impl ManifestOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Deploys `kinds` of a manifest in order, stopping at the first failure
pub fn deploy_manifest<S: SchemaStore>(
    store: &S,
    manifest: &Manifest,
    kinds: &[ArtifactKind],
    options: &DeployOptions,
) -> ManifestOutcome {
    let mut outcome = ManifestOutcome {
        committed: Vec::new(),
        failure: None,
        skipped: Vec::new(),
    };

    for (index, kind) in kinds.iter().enumerate() {
        match deploy_kind(store, manifest, *kind, options) {
            Ok(report) => outcome.committed.push(report),
            Err(error) => {
                outcome.failure = Some(error);
                outcome.skipped = kinds[index + 1..].to_vec();
                break;
            }
        }
    }

    info!(
        committed = outcome.committed.len(),
        failed = outcome.failure.is_some(),
        skipped = outcome.skipped.len(),
        "manifest run finished"
    );
    outcome
}
