//! Conflict checking
//!
//! Read-only: decides whether any key of an incoming batch already exists
//! in the store, before the deployer mutates anything.

use std::collections::{BTreeSet, HashSet};
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Artifact, ArtifactKey};
use crate::storage::{ArtifactStore, StoreError};

/// How existing keys are fetched from the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// One `list_keys` call, intersected with the batch
    #[default]
    Bulk,
    /// One `find_by_key` call per candidate key
    Probe,
}

pub struct ConflictChecker<'s, S, A> {
    store: &'s S,
    strategy: ConflictStrategy,
    _kind: PhantomData<fn() -> A>,
}

impl<'s, S, A> ConflictChecker<'s, S, A>
where
    A: Artifact,
    S: ArtifactStore<A>,
{
    pub fn new(store: &'s S, strategy: ConflictStrategy) -> Self {
        Self {
            store,
            strategy,
            _kind: PhantomData,
        }
    }

    /// True if any candidate key already exists
    pub fn has_conflicts(&self, candidates: &[ArtifactKey]) -> Result<bool, StoreError> {
        Ok(!self.conflicts(candidates)?.is_empty())
    }

    /// Returns the candidate keys that already exist, in candidate order
    pub fn conflicts(&self, candidates: &[ArtifactKey]) -> Result<Vec<ArtifactKey>, StoreError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let colliding = match self.strategy {
            ConflictStrategy::Bulk => {
                let existing = self.store.list_keys()?;
                candidates
                    .iter()
                    .filter(|k| existing.contains(*k))
                    .cloned()
                    .collect()
            }
            ConflictStrategy::Probe => {
                let mut colliding = Vec::new();
                for key in candidates {
                    if self.store.find_by_key(key)?.is_some() {
                        colliding.push(key.clone());
                    }
                }
                colliding
            }
        };

        debug!(
            kind = %A::KIND,
            strategy = ?self.strategy,
            candidates = candidates.len(),
            conflicts = colliding.len(),
            "conflict check done"
        );
        Ok(colliding)
    }
}

/// Keys that occur more than once in `keys`, each reported once, in first-repeat order
pub fn find_duplicates(keys: &[ArtifactKey]) -> Vec<ArtifactKey> {
    let mut seen = HashSet::new();
    let mut reported = BTreeSet::new();
    let mut duplicates = Vec::new();

    for key in keys {
        if !seen.insert(key) && reported.insert(key) {
            duplicates.push(key.clone());
        }
    }
    duplicates
}
