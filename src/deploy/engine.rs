//! Deployment engine
//!
//! Runs one batch of one artifact kind through the protocol:
//!
//! 1. Pre-flight: extract keys, reject duplicates within the batch, reject
//!    keys that already exist. Nothing is written if any of this fails.
//! 2. Create: build and create each artifact in batch order, recording it
//!    in the rollback ledger right after the store accepts it.
//! 3. Link: resolve cross-references for every created artifact, verify the
//!    linked batch, then persist the artifacts whose links changed.
//! 4. Commit, or on any failure in 2-3 delete the ledger newest first.

use std::fmt;

use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

use super::adapter::{DroppedReference, KindAdapter, LinkContext};
use super::conflict::{find_duplicates, ConflictChecker, ConflictStrategy};
use super::error::{DeployError, Phase, RollbackFailure, RollbackReport, StepError};
use super::ledger::RollbackLedger;
use super::retract::{retract_keys, RetractReport};
use crate::domain::{Artifact, ArtifactId, ArtifactKey, ArtifactKind};
use crate::storage::ArtifactStore;

/// Where the last batch got to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployState {
    Idle,
    /// Pre-flight failed; the store was not touched
    Rejected,
    ConflictChecked,
    Created,
    Linked,
    Committed,
    RollingBack,
    RolledBack,
}

impl fmt::Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeployState::Idle => "idle",
            DeployState::Rejected => "rejected",
            DeployState::ConflictChecked => "conflict-checked",
            DeployState::Created => "created",
            DeployState::Linked => "linked",
            DeployState::Committed => "committed",
            DeployState::RollingBack => "rolling-back",
            DeployState::RolledBack => "rolled-back",
        };
        f.write_str(s)
    }
}

/// One artifact written by a committed batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployedArtifact {
    pub key: ArtifactKey,
    pub id: Option<ArtifactId>,
}

/// Outcome of a committed batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployReport {
    pub kind: ArtifactKind,

    /// Created artifacts, in batch order
    pub deployed: Vec<DeployedArtifact>,

    /// Number of link updates persisted
    pub updated: usize,

    /// References that did not resolve and were left out
    pub dropped: Vec<DroppedReference>,
}

/// Failure inside the create or link phase, before rollback
struct PhaseFailure {
    phase: Phase,
    key: Option<ArtifactKey>,
    cause: StepError,
}

impl PhaseFailure {
    fn new(phase: Phase, key: Option<&ArtifactKey>, cause: impl Into<StepError>) -> Self {
        Self {
            phase,
            key: key.cloned(),
            cause: cause.into(),
        }
    }
}

/// Deploys batches of one artifact kind against a store
pub struct Deployer<'s, S, K> {
    store: &'s S,
    adapter: K,
    conflict_strategy: ConflictStrategy,
    strict_references: bool,
    state: DeployState,
}

impl<'s, S, K> Deployer<'s, S, K>
where
    K: KindAdapter,
    S: ArtifactStore<K::Artifact>,
{
    pub fn new(store: &'s S, adapter: K) -> Self {
        Self {
            store,
            adapter,
            conflict_strategy: ConflictStrategy::default(),
            strict_references: false,
            state: DeployState::Idle,
        }
    }

    pub fn with_conflict_strategy(mut self, strategy: ConflictStrategy) -> Self {
        self.conflict_strategy = strategy;
        self
    }

    /// Fails the batch on any unresolved reference instead of dropping it
    pub fn with_strict_references(mut self, strict: bool) -> Self {
        self.strict_references = strict;
        self
    }

    pub fn kind(&self) -> ArtifactKind {
        K::Artifact::KIND
    }

    /// State reached by the last batch
    pub fn state(&self) -> DeployState {
        self.state
    }

    /// Runs pre-flight without writing; returns the keys that already exist
    pub fn check(&self, batch: &[K::Definition]) -> Result<Vec<ArtifactKey>, DeployError> {
        let keys = self.batch_keys(batch)?;
        self.reject_duplicates(&keys)?;
        self.existing(&keys)
    }

    /// Deploys a batch, all or nothing (best effort)
    pub fn deploy(&mut self, batch: &[K::Definition]) -> Result<DeployReport, DeployError> {
        let kind = self.kind();
        let span = info_span!("deploy", %kind, size = batch.len());
        let _guard = span.enter();

        self.state = DeployState::Idle;

        let keys = match self.preflight(batch) {
            Ok(keys) => keys,
            Err(e) => {
                self.transition(DeployState::Rejected);
                return Err(e);
            }
        };
        self.transition(DeployState::ConflictChecked);

        let mut ledger = RollbackLedger::new();
        if let Err(failure) = self.create_phase(batch, &keys, &mut ledger) {
            return Err(self.abort(failure, ledger));
        }
        self.transition(DeployState::Created);

        let mut links = LinkContext::new(self.strict_references);
        let updated = match self.link_phase(batch, &mut ledger, &mut links) {
            Ok(updated) => updated,
            Err(failure) => return Err(self.abort(failure, ledger)),
        };
        self.transition(DeployState::Linked);

        let deployed = ledger
            .deployed()
            .into_iter()
            .map(|(key, id)| DeployedArtifact { key, id })
            .collect::<Vec<_>>();
        self.transition(DeployState::Committed);

        let dropped = links.into_dropped();
        info!(
            created = deployed.len(),
            updated,
            dropped = dropped.len(),
            "batch committed"
        );

        Ok(DeployReport {
            kind,
            deployed,
            updated,
            dropped,
        })
    }

    /// Removes the batch's artifacts by key, best effort
    pub fn retract(&self, batch: &[K::Definition]) -> Result<RetractReport, DeployError> {
        let mut keys = self.batch_keys(batch)?;
        keys.reverse();
        Ok(retract_keys::<S, K::Artifact>(self.store, &keys))
    }

    fn batch_keys(&self, batch: &[K::Definition]) -> Result<Vec<ArtifactKey>, DeployError> {
        batch
            .iter()
            .enumerate()
            .map(|(index, definition)| {
                self.adapter
                    .key(definition)
                    .map_err(|e| DeployError::InvalidDefinition {
                        kind: self.kind(),
                        index,
                        message: e.to_string(),
                    })
            })
            .collect()
    }

    fn preflight(&self, batch: &[K::Definition]) -> Result<Vec<ArtifactKey>, DeployError> {
        let keys = self.batch_keys(batch)?;
        self.reject_duplicates(&keys)?;

        let conflicts = self.existing(&keys)?;
        if !conflicts.is_empty() {
            return Err(DeployError::Conflict {
                kind: self.kind(),
                keys: conflicts,
            });
        }
        Ok(keys)
    }

    fn reject_duplicates(&self, keys: &[ArtifactKey]) -> Result<(), DeployError> {
        let duplicates = find_duplicates(keys);
        if duplicates.is_empty() {
            return Ok(());
        }
        Err(DeployError::DuplicateKeys {
            kind: self.kind(),
            keys: duplicates,
        })
    }

    fn existing(&self, keys: &[ArtifactKey]) -> Result<Vec<ArtifactKey>, DeployError> {
        ConflictChecker::<S, K::Artifact>::new(self.store, self.conflict_strategy)
            .conflicts(keys)
            .map_err(|source| DeployError::ConflictCheck {
                kind: self.kind(),
                source,
            })
    }

    fn create_phase(
        &self,
        batch: &[K::Definition],
        keys: &[ArtifactKey],
        ledger: &mut RollbackLedger<K::Artifact>,
    ) -> Result<(), PhaseFailure> {
        for (definition, key) in batch.iter().zip(keys) {
            let artifact = self
                .adapter
                .build(definition)
                .map_err(|e| PhaseFailure::new(Phase::Create, Some(key), e))?;

            let created = self
                .store
                .create(artifact)
                .map_err(|e| PhaseFailure::new(Phase::Create, Some(key), e))?;

            debug!(key = %key, id = ?created.id().map(|id| id.to_string()), "created");
            ledger.record(created);
        }
        Ok(())
    }

    fn link_phase(
        &self,
        batch: &[K::Definition],
        ledger: &mut RollbackLedger<K::Artifact>,
        links: &mut LinkContext,
    ) -> Result<usize, PhaseFailure> {
        let mut linked = ledger.entries().to_vec();
        let mut changed = Vec::new();

        for (index, (definition, artifact)) in batch.iter().zip(linked.iter_mut()).enumerate() {
            let key = artifact.key().clone();
            if self
                .adapter
                .link(definition, artifact, links)
                .map_err(|e| PhaseFailure::new(Phase::Link, Some(&key), e))?
            {
                changed.push(index);
            }
        }

        self.adapter
            .verify(&linked)
            .map_err(|e| PhaseFailure::new(Phase::Link, None, e))?;

        for index in &changed {
            let artifact = &linked[*index];
            let updated = self
                .store
                .update(artifact)
                .map_err(|e| PhaseFailure::new(Phase::Link, Some(artifact.key()), e))?;

            debug!(key = %artifact.key(), "linked");
            ledger.replace(*index, updated);
        }

        Ok(changed.len())
    }

    fn abort(&mut self, failure: PhaseFailure, ledger: RollbackLedger<K::Artifact>) -> DeployError {
        error!(
            phase = %failure.phase,
            key = ?failure.key.as_ref().map(|k| k.to_string()),
            error = %failure.cause,
            created = ledger.len(),
            "batch failed, rolling back"
        );

        self.transition(DeployState::RollingBack);
        let rollback = self.rollback(ledger);
        self.transition(DeployState::RolledBack);

        DeployError::Aborted {
            kind: self.kind(),
            phase: failure.phase,
            key: failure.key,
            cause: failure.cause,
            rollback,
        }
    }

    fn rollback(&self, ledger: RollbackLedger<K::Artifact>) -> RollbackReport {
        let mut report = RollbackReport::default();

        for artifact in ledger.into_rollback_order() {
            let key = artifact.key().clone();
            match self.store.delete(&artifact) {
                Ok(()) => {
                    debug!(key = %key, "rolled back");
                    report.deleted.push(key);
                }
                Err(error) => {
                    warn!(key = %key, error = %error, "rollback delete failed, artifact left in store");
                    report.failures.push(RollbackFailure { key, error });
                }
            }
        }

        if !report.is_clean() {
            error!(
                leftovers = report.failures.len(),
                "rollback incomplete, store holds artifacts from the failed batch"
            );
        }
        report
    }

    fn transition(&mut self, next: DeployState) {
        debug!(from = %self.state, to = %next, "state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::kinds::{ScriptAdapter, TemplateAdapter};
    use crate::domain::{Script, Template};
    use crate::manifest::{ScriptDefinition, TemplateDefinition};
    use crate::storage::{MemoryStore, StoreOperation};

    fn key(s: &str) -> ArtifactKey {
        ArtifactKey::new(s).unwrap()
    }

    fn scripts(names: &[&str]) -> Vec<ScriptDefinition> {
        names
            .iter()
            .map(|n| ScriptDefinition {
                name: n.to_string(),
                content: format!("// {}", n),
            })
            .collect()
    }

    fn template(alias: &str, master: Option<&str>) -> TemplateDefinition {
        TemplateDefinition {
            name: alias.to_uppercase(),
            alias: alias.to_string(),
            content: String::new(),
            master_template_alias: master.map(str::to_string),
        }
    }

    #[test]
    fn commit_reports_created_in_order() {
        let store = MemoryStore::new();
        let mut deployer = Deployer::new(&store, ScriptAdapter);

        let report = deployer.deploy(&scripts(&["a.js", "b.js"])).unwrap();

        assert_eq!(deployer.state(), DeployState::Committed);
        let keys: Vec<_> = report.deployed.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["a.js", "b.js"]);
        assert!(report.deployed.iter().all(|d| d.id.is_some()));
        assert_eq!(report.updated, 0);
        assert_eq!(store.count(StoreOperation::Update), 0);
    }

    #[test]
    fn conflict_rejects_before_writing() {
        let store = MemoryStore::new();
        store.create(Script::new(key("b.js"), "")).unwrap();
        let mut deployer = Deployer::new(&store, ScriptAdapter);

        let err = deployer.deploy(&scripts(&["a.js", "b.js"])).unwrap_err();

        assert!(matches!(err, DeployError::Conflict { ref keys, .. } if keys == &vec![key("b.js")]));
        assert_eq!(deployer.state(), DeployState::Rejected);
        assert_eq!(store.count(StoreOperation::Create), 1);
    }

    #[test]
    fn duplicate_keys_rejected_before_conflict_check() {
        let store = MemoryStore::new();
        let mut deployer = Deployer::new(&store, ScriptAdapter);

        let err = deployer.deploy(&scripts(&["a.js", "a.js"])).unwrap_err();

        assert!(matches!(err, DeployError::DuplicateKeys { .. }));
        assert!(store.journal().is_empty());
    }

    #[test]
    fn blank_key_is_invalid_definition() {
        let store = MemoryStore::new();
        let mut deployer = Deployer::new(&store, ScriptAdapter);

        let err = deployer.deploy(&scripts(&["a.js", "  "])).unwrap_err();

        assert!(matches!(err, DeployError::InvalidDefinition { index: 1, .. }));
        assert!(store.journal().is_empty());
    }

    #[test]
    fn create_failure_rolls_back_newest_first() {
        let store = MemoryStore::new();
        store.fail_on(StoreOperation::Create, ArtifactKind::Script, "c.js");
        let mut deployer = Deployer::new(&store, ScriptAdapter);

        let err = deployer.deploy(&scripts(&["a.js", "b.js", "c.js", "d.js"])).unwrap_err();

        match err {
            DeployError::Aborted {
                phase,
                key: failed,
                rollback,
                ..
            } => {
                assert_eq!(phase, Phase::Create);
                assert_eq!(failed, Some(key("c.js")));
                assert_eq!(rollback.deleted, vec![key("b.js"), key("a.js")]);
                assert!(rollback.is_clean());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(deployer.state(), DeployState::RolledBack);
        assert_eq!(store.len_of(ArtifactKind::Script), 0);
    }

    #[test]
    fn failed_rollback_delete_is_reported() {
        let store = MemoryStore::new();
        store.fail_on(StoreOperation::Create, ArtifactKind::Script, "c.js");
        store.fail_on(StoreOperation::Delete, ArtifactKind::Script, "a.js");
        let mut deployer = Deployer::new(&store, ScriptAdapter);

        let err = deployer.deploy(&scripts(&["a.js", "b.js", "c.js"])).unwrap_err();

        let rollback = err.rollback().unwrap();
        assert_eq!(rollback.deleted, vec![key("b.js")]);
        assert_eq!(rollback.leftovers(), vec![&key("a.js")]);
        assert_eq!(deployer.state(), DeployState::RolledBack);
        assert_eq!(store.len_of(ArtifactKind::Script), 1);
    }

    #[test]
    fn forward_references_link_within_batch() {
        let store = MemoryStore::new();
        let mut deployer = Deployer::new(&store, TemplateAdapter::new(&store));

        let report = deployer
            .deploy(&[template("home", Some("master")), template("master", None)])
            .unwrap();

        assert_eq!(report.updated, 1);
        let home: Template = store.find_by_key(&key("home")).unwrap().unwrap();
        let master: Template = store.find_by_key(&key("master")).unwrap().unwrap();
        assert_eq!(home.master_template.as_ref(), master.id());
    }

    #[test]
    fn unresolved_reference_is_dropped_and_reported() {
        let store = MemoryStore::new();
        let mut deployer = Deployer::new(&store, TemplateAdapter::new(&store));

        let report = deployer.deploy(&[template("home", Some("ghost"))]).unwrap();

        assert_eq!(report.dropped.len(), 1);
        assert_eq!(report.dropped[0].identifier, "ghost");
        assert_eq!(report.dropped[0].field, "MasterTemplateAlias");
        assert_eq!(report.updated, 0);
    }

    #[test]
    fn strict_references_roll_back() {
        let store = MemoryStore::new();
        let mut deployer =
            Deployer::new(&store, TemplateAdapter::new(&store)).with_strict_references(true);

        let err = deployer
            .deploy(&[template("master", None), template("home", Some("ghost"))])
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::Aborted {
                phase: Phase::Link,
                cause: StepError::UnresolvedReference { .. },
                ..
            }
        ));
        assert_eq!(store.len_of(ArtifactKind::Template), 0);
    }

    #[test]
    fn master_cycle_rolls_back_without_updates() {
        let store = MemoryStore::new();
        let mut deployer = Deployer::new(&store, TemplateAdapter::new(&store));

        let err = deployer
            .deploy(&[template("a", Some("b")), template("b", Some("a"))])
            .unwrap_err();

        assert!(matches!(err, DeployError::Aborted { phase: Phase::Link, key: None, .. }));
        assert_eq!(store.count(StoreOperation::Update), 0);
        assert_eq!(store.len_of(ArtifactKind::Template), 0);
    }

    #[test]
    fn update_failure_rolls_back_everything() {
        let store = MemoryStore::new();
        store.fail_on(StoreOperation::Update, ArtifactKind::Template, "home");
        let mut deployer = Deployer::new(&store, TemplateAdapter::new(&store));

        let err = deployer
            .deploy(&[template("master", None), template("home", Some("master"))])
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::Aborted { phase: Phase::Link, key: Some(ref k), .. } if k == &key("home")
        ));
        assert_eq!(store.len_of(ArtifactKind::Template), 0);
    }

    #[test]
    fn check_never_writes() {
        let store = MemoryStore::new();
        store.create(Script::new(key("a.js"), "")).unwrap();
        let deployer = Deployer::new(&store, ScriptAdapter);

        let existing = deployer.check(&scripts(&["a.js", "b.js"])).unwrap();

        assert_eq!(existing, vec![key("a.js")]);
        assert_eq!(store.count(StoreOperation::Create), 1);
        assert_eq!(deployer.state(), DeployState::Idle);
    }

    #[test]
    fn retract_goes_in_reverse_batch_order() {
        let store = MemoryStore::new();
        let mut deployer = Deployer::new(&store, ScriptAdapter);
        deployer.deploy(&scripts(&["a.js", "b.js"])).unwrap();

        let report = deployer.retract(&scripts(&["a.js", "b.js", "c.js"])).unwrap();

        assert_eq!(report.missing, vec![key("c.js")]);
        assert_eq!(report.removed, vec![key("b.js"), key("a.js")]);
    }
}
