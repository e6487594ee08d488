//! Retract: best-effort removal by key
//!
//! No conflict check and no rollback. Each key is looked up and deleted on
//! its own; failures are collected and processing moves on.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{Artifact, ArtifactKey, ArtifactKind};
use crate::storage::{ArtifactStore, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetractFailure {
    pub key: ArtifactKey,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetractReport {
    pub kind: ArtifactKind,
    pub removed: Vec<ArtifactKey>,

    /// Keys that were not in the store
    pub missing: Vec<ArtifactKey>,

    pub failures: Vec<RetractFailure>,
}

impl RetractReport {
    fn new(kind: ArtifactKind) -> Self {
        Self {
            kind,
            removed: Vec::new(),
            missing: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Deletes every key in `keys`, in the order given
pub fn retract_keys<S, A>(store: &S, keys: &[ArtifactKey]) -> RetractReport
where
    A: Artifact,
    S: ArtifactStore<A>,
{
    let mut report = RetractReport::new(A::KIND);

    for key in keys {
        match remove(store, key) {
            Ok(true) => {
                debug!(kind = %A::KIND, key = %key, "retracted");
                report.removed.push(key.clone());
            }
            Ok(false) => report.missing.push(key.clone()),
            Err(error) => {
                warn!(kind = %A::KIND, key = %key, error = %error, "retract failed");
                report.failures.push(RetractFailure {
                    key: key.clone(),
                    error: error.to_string(),
                });
            }
        }
    }

    info!(
        kind = %A::KIND,
        removed = report.removed.len(),
        missing = report.missing.len(),
        failed = report.failures.len(),
        "retract done"
    );
    report
}

fn remove<S, A>(store: &S, key: &ArtifactKey) -> Result<bool, StoreError>
where
    A: Artifact,
    S: ArtifactStore<A>,
{
    match store.find_by_key(key)? {
        Some(artifact) => store.delete(&artifact).map(|()| true),
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Stylesheet;
    use crate::storage::{MemoryStore, StoreOperation};

    fn key(s: &str) -> ArtifactKey {
        ArtifactKey::new(s).unwrap()
    }

    #[test]
    fn removes_present_and_reports_missing() {
        let store = MemoryStore::new();
        store.create(Stylesheet::new(key("a.css"), "")).unwrap();

        let report = retract_keys::<_, Stylesheet>(&store, &[key("a.css"), key("b.css")]);

        assert_eq!(report.removed, vec![key("a.css")]);
        assert_eq!(report.missing, vec![key("b.css")]);
        assert!(report.is_clean());
        assert_eq!(store.len_of(ArtifactKind::Stylesheet), 0);
    }

    #[test]
    fn failure_does_not_stop_the_rest() {
        let store = MemoryStore::new();
        store.create(Stylesheet::new(key("a.css"), "")).unwrap();
        store.create(Stylesheet::new(key("b.css"), "")).unwrap();
        store.fail_on(StoreOperation::Delete, ArtifactKind::Stylesheet, "a.css");

        let report = retract_keys::<_, Stylesheet>(&store, &[key("a.css"), key("b.css")]);

        assert_eq!(report.failures[0].key, key("a.css"));
        assert_eq!(report.removed, vec![key("b.css")]);
        assert_eq!(store.len_of(ArtifactKind::Stylesheet), 1);
    }
}
