//! # Deployment
//!
//! Conflict-checked, best-effort transactional deployment of artifact
//! batches against a [`SchemaStore`](crate::storage::SchemaStore).
//!
//! A batch is all definitions of one kind. The [`Deployer`] rejects it
//! before writing if any key repeats within the batch or already exists in
//! the store. Otherwise it creates every artifact, then links references
//! between them, and on any failure deletes what it created. Rollback is
//! best effort: deletes that fail are logged and reported in a
//! [`RollbackReport`], never retried.
//!
//! ```text
//! Idle -> ConflictChecked -> Created -> Linked -> Committed
//!                               \-> RollingBack -> RolledBack
//! Idle -> Rejected  (duplicate, conflicting or invalid keys)
//! ```

mod adapter;
mod conflict;
mod engine;
mod error;
mod kinds;
mod ledger;
mod plan;
mod resolver;
mod retract;

pub use adapter::{DroppedReference, KindAdapter, LinkContext};
pub use conflict::{find_duplicates, ConflictChecker, ConflictStrategy};
pub use engine::{DeployReport, DeployState, DeployedArtifact, Deployer};
pub use error::{DeployError, Phase, RollbackFailure, RollbackReport, StepError};
pub use kinds::{
    ContentTypeAdapter, DataTypeAdapter, MacroAdapter, PartialViewAdapter, ScriptAdapter,
    StylesheetAdapter, TemplateAdapter,
};
pub use ledger::RollbackLedger;
pub use plan::{
    check_kind, deploy_kind, deploy_manifest, retract_kind, selected_kinds, DeployOptions,
    ManifestOutcome,
};
pub use resolver::{split_identifiers, Resolution, ResolvedRef, ReferenceResolver};
pub use retract::{retract_keys, RetractFailure, RetractReport};
