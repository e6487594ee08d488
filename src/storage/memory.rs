//! In-memory store
//!
//! Implements the same contract as [`FileStore`](super::FileStore) without
//! touching disk. Used for dry runs (seeded from a snapshot of the real
//! store) and in tests, where faults can be injected per operation and key
//! and every call is journaled.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde_json::Value;

use super::store::{assign_new_id, ArtifactStore, SchemaStore, StoreError, StoreOperation};
use crate::domain::{
    Artifact, ArtifactId, ArtifactKey, ArtifactKind, ContentType, DataType, Macro, PartialView,
    Script, Stylesheet, Template,
};

/// A fault to raise when a matching call arrives
#[derive(Debug, Clone, PartialEq)]
struct Fault {
    operation: StoreOperation,
    kind: ArtifactKind,
    /// `None` matches every key
    key: Option<ArtifactKey>,
}

/// One recorded store call
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub operation: StoreOperation,
    pub kind: ArtifactKind,
    pub key: Option<ArtifactKey>,
}

#[derive(Debug, Default)]
struct State {
    /// Stored artifacts per kind, as JSON, in creation order
    artifacts: HashMap<ArtifactKind, Vec<(ArtifactKey, Value)>>,
    faults: Vec<Fault>,
    journal: Vec<JournalEntry>,
}

/// In-memory store for all artifact kinds
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding a copy of everything in `source`
    pub fn snapshot_of<S: SchemaStore>(source: &S) -> Result<Self, StoreError> {
        let store = Self::new();
        store.copy_kind::<ContentType, S>(source)?;
        store.copy_kind::<DataType, S>(source)?;
        store.copy_kind::<Template, S>(source)?;
        store.copy_kind::<Macro, S>(source)?;
        store.copy_kind::<Script, S>(source)?;
        store.copy_kind::<Stylesheet, S>(source)?;
        store.copy_kind::<PartialView, S>(source)?;
        // Copying is not part of the observable history
        store.lock().journal.clear();
        Ok(store)
    }

    fn copy_kind<A: Artifact, S: ArtifactStore<A>>(&self, source: &S) -> Result<(), StoreError> {
        for artifact in source.list_all()? {
            self.seed(artifact)?;
        }
        Ok(())
    }

    /// Inserts an artifact as-is, keeping any ID it already carries
    pub fn seed<A: Artifact>(&self, mut artifact: A) -> Result<A, StoreError> {
        let mut state = self.lock();
        if artifact.id().is_none() {
            let taken = Self::ids_of::<A>(&state);
            assign_new_id(&mut artifact, Utc::now(), |id| taken.contains(id));
        }
        let value = Self::to_value(&artifact)?;
        let entries = state.artifacts.entry(A::KIND).or_default();
        entries.retain(|(k, _)| k != artifact.key());
        entries.push((artifact.key().clone(), value));
        Ok(artifact)
    }

    /// Makes every `operation` on `kind` with `key` fail
    pub fn fail_on(&self, operation: StoreOperation, kind: ArtifactKind, key: &str) {
        let key = ArtifactKey::new(key).ok();
        self.lock().faults.push(Fault { operation, kind, key });
    }

    /// Makes every `operation` on `kind` fail, whatever the key
    pub fn fail_all(&self, operation: StoreOperation, kind: ArtifactKind) {
        self.lock().faults.push(Fault {
            operation,
            kind,
            key: None,
        });
    }

    /// Removes all injected faults
    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// Returns every call made so far
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.lock().journal.clone()
    }

    /// Counts calls of one operation
    pub fn count(&self, operation: StoreOperation) -> usize {
        self.lock()
            .journal
            .iter()
            .filter(|e| e.operation == operation)
            .count()
    }

    /// Number of stored artifacts of `kind`
    pub fn len_of(&self, kind: ArtifactKind) -> usize {
        self.lock().artifacts.get(&kind).map(Vec::len).unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock cannot leave the maps half-written
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(
        state: &mut State,
        operation: StoreOperation,
        kind: ArtifactKind,
        key: Option<&ArtifactKey>,
    ) -> Result<(), StoreError> {
        state.journal.push(JournalEntry {
            operation,
            kind,
            key: key.cloned(),
        });

        let hit = state.faults.iter().any(|f| {
            f.operation == operation
                && f.kind == kind
                && (f.key.is_none() || f.key.as_ref() == key)
        });

        if hit {
            return Err(StoreError::Rejected {
                operation,
                kind,
                key: key.map(|k| k.to_string()).unwrap_or_default(),
                reason: "injected fault".to_string(),
            });
        }
        Ok(())
    }

    fn ids_of<A: Artifact>(state: &State) -> Vec<ArtifactId> {
        state
            .artifacts
            .get(&A::KIND)
            .into_iter()
            .flatten()
            .filter_map(|(_, v)| v.get("id").and_then(Value::as_str))
            .filter_map(|s| s.parse().ok())
            .collect()
    }

    fn to_value<A: Artifact>(artifact: &A) -> Result<Value, StoreError> {
        serde_json::to_value(artifact)
            .map_err(|e| StoreError::Corrupt(format!("{} '{}': {}", A::KIND, artifact.key(), e)))
    }

    fn from_value<A: Artifact>(value: &Value) -> Result<A, StoreError> {
        serde_json::from_value(value.clone())
            .map_err(|e| StoreError::Corrupt(format!("{}: {}", A::KIND, e)))
    }
}

impl<A: Artifact> ArtifactStore<A> for MemoryStore {
    fn find_by_key(&self, key: &ArtifactKey) -> Result<Option<A>, StoreError> {
        let mut state = self.lock();
        Self::enter(&mut state, StoreOperation::Lookup, A::KIND, Some(key))?;

        state
            .artifacts
            .get(&A::KIND)
            .and_then(|entries| entries.iter().find(|(k, _)| k == key))
            .map(|(_, v)| Self::from_value(v))
            .transpose()
    }

    fn create(&self, mut artifact: A) -> Result<A, StoreError> {
        let mut state = self.lock();
        Self::enter(&mut state, StoreOperation::Create, A::KIND, Some(artifact.key()))?;

        let exists = state
            .artifacts
            .get(&A::KIND)
            .is_some_and(|entries| entries.iter().any(|(k, _)| k == artifact.key()));
        if exists {
            return Err(StoreError::AlreadyExists {
                kind: A::KIND,
                key: artifact.key().clone(),
            });
        }

        let taken = Self::ids_of::<A>(&state);
        assign_new_id(&mut artifact, Utc::now(), |id| taken.contains(id));

        let value = Self::to_value(&artifact)?;
        state
            .artifacts
            .entry(A::KIND)
            .or_default()
            .push((artifact.key().clone(), value));

        Ok(artifact)
    }

    fn update(&self, artifact: &A) -> Result<A, StoreError> {
        let mut state = self.lock();
        Self::enter(&mut state, StoreOperation::Update, A::KIND, Some(artifact.key()))?;

        let not_found = || StoreError::NotFound {
            kind: A::KIND,
            key: artifact.key().clone(),
        };

        let entries = state.artifacts.get_mut(&A::KIND).ok_or_else(not_found)?;
        let slot = entries
            .iter_mut()
            .find(|(k, _)| k == artifact.key())
            .ok_or_else(not_found)?;

        let stored: A = Self::from_value(&slot.1)?;
        let mut updated = artifact.clone();
        *updated.meta_mut() = stored.meta().clone();
        updated.meta_mut().touch(Utc::now());

        slot.1 = Self::to_value(&updated)?;
        Ok(updated)
    }

    fn delete(&self, artifact: &A) -> Result<(), StoreError> {
        let mut state = self.lock();
        Self::enter(&mut state, StoreOperation::Delete, A::KIND, Some(artifact.key()))?;

        let entries = state.artifacts.entry(A::KIND).or_default();
        let before = entries.len();
        entries.retain(|(k, _)| k != artifact.key());

        if entries.len() == before {
            return Err(StoreError::NotFound {
                kind: A::KIND,
                key: artifact.key().clone(),
            });
        }
        Ok(())
    }

    fn list_keys(&self) -> Result<BTreeSet<ArtifactKey>, StoreError> {
        let mut state = self.lock();
        Self::enter(&mut state, StoreOperation::ListKeys, A::KIND, None)?;

        Ok(state
            .artifacts
            .get(&A::KIND)
            .into_iter()
            .flatten()
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn list_all(&self) -> Result<Vec<A>, StoreError> {
        let mut state = self.lock();
        Self::enter(&mut state, StoreOperation::ListKeys, A::KIND, None)?;

        state
            .artifacts
            .get(&A::KIND)
            .into_iter()
            .flatten()
            .map(|(_, v)| Self::from_value(v))
            .collect()
    }
}
