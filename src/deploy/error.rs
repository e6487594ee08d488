//! Deployment errors and rollback outcomes

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{ArtifactKey, ArtifactKind, GraphError};
use crate::storage::StoreError;

/// Failure of a single step inside the create or link phase
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StepError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid {kind} '{key}': {message}")]
    Validation {
        kind: ArtifactKind,
        key: String,
        message: String,
    },

    #[error("{kind} '{owner}' {field} references unknown {}: {}", .kind.plural(), .identifiers.join(", "))]
    UnresolvedReference {
        kind: ArtifactKind,
        owner: ArtifactKey,
        field: &'static str,
        identifiers: Vec<String>,
    },
}

impl StepError {
    pub fn validation(kind: ArtifactKind, key: impl fmt::Display, message: impl Into<String>) -> Self {
        StepError::Validation {
            kind,
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// Wraps a reference-graph failure as a validation error
    pub fn from_graph(kind: ArtifactKind, error: GraphError) -> Self {
        let key = match &error {
            GraphError::SelfReference(key) => key.to_string(),
            GraphError::CycleDetected(keys) => keys
                .first()
                .map(|k| k.to_string())
                .unwrap_or_default(),
        };
        StepError::Validation {
            kind,
            key,
            message: error.to_string(),
        }
    }
}

/// The mutating phase a batch failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Create,
    Link,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Create => f.write_str("create phase"),
            Phase::Link => f.write_str("link phase"),
        }
    }
}

/// A delete issued during rollback that failed
#[derive(Debug, Clone, PartialEq)]
pub struct RollbackFailure {
    pub key: ArtifactKey,
    pub error: StoreError,
}

/// What rollback managed to undo
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollbackReport {
    /// Keys deleted again, newest first
    pub deleted: Vec<ArtifactKey>,

    /// Deletes that failed; these artifacts are still in the store
    pub failures: Vec<RollbackFailure>,
}

impl RollbackReport {
    /// True if every created artifact was removed again
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Keys of artifacts the failed batch left behind
    pub fn leftovers(&self) -> Vec<&ArtifactKey> {
        self.failures.iter().map(|f| &f.key).collect()
    }
}

impl fmt::Display for RollbackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            write!(f, "rolled back {} artifact(s)", self.deleted.len())
        } else {
            let leftovers: Vec<_> = self.leftovers().iter().map(|k| k.as_str()).collect();
            write!(
                f,
                "rolled back {} artifact(s), {} could not be removed: {}",
                self.deleted.len(),
                self.failures.len(),
                leftovers.join(", ")
            )
        }
    }
}

fn join_keys(keys: &[ArtifactKey]) -> String {
    keys.iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn at_key(key: &Option<ArtifactKey>) -> String {
    match key {
        Some(k) => format!(" at '{}'", k),
        None => String::new(),
    }
}

/// Outcome of a failed `deploy`
#[derive(Debug, Error)]
pub enum DeployError {
    /// A definition has no usable key; nothing was written
    #[error("Invalid {kind} definition #{index}: {message}")]
    InvalidDefinition {
        kind: ArtifactKind,
        index: usize,
        message: String,
    },

    /// The batch names the same key more than once; nothing was written
    #[error("The batch contains duplicate {}: {}", .kind.plural(), join_keys(.keys))]
    DuplicateKeys {
        kind: ArtifactKind,
        keys: Vec<ArtifactKey>,
    },

    /// Some keys already exist in the store; nothing was written
    #[error("The batch could not be deployed as it contains {} that already exist: {}", .kind.plural(), join_keys(.keys))]
    Conflict {
        kind: ArtifactKind,
        keys: Vec<ArtifactKey>,
    },

    /// The conflict check itself failed; nothing was written
    #[error("Conflict check for {} failed: {source}", .kind.plural())]
    ConflictCheck {
        kind: ArtifactKind,
        #[source]
        source: StoreError,
    },

    /// A step failed after the store was modified; rollback has run
    #[error("Deploying {} failed in the {phase}{}: {cause} ({rollback})", .kind.plural(), at_key(.key))]
    Aborted {
        kind: ArtifactKind,
        phase: Phase,
        key: Option<ArtifactKey>,
        #[source]
        cause: StepError,
        rollback: RollbackReport,
    },
}

impl DeployError {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            DeployError::InvalidDefinition { kind, .. }
            | DeployError::DuplicateKeys { kind, .. }
            | DeployError::Conflict { kind, .. }
            | DeployError::ConflictCheck { kind, .. }
            | DeployError::Aborted { kind, .. } => *kind,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, DeployError::Conflict { .. })
    }

    /// True if the store was never modified
    pub fn before_mutation(&self) -> bool {
        !matches!(self, DeployError::Aborted { .. })
    }

    /// The rollback outcome, for failures that happened after mutation
    pub fn rollback(&self) -> Option<&RollbackReport> {
        match self {
            DeployError::Aborted { rollback, .. } => Some(rollback),
            _ => None,
        }
    }

    /// The store error behind the failure, if any
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            DeployError::ConflictCheck { source, .. } => Some(source),
            DeployError::Aborted {
                cause: StepError::Store(e),
                ..
            } => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreOperation;

    fn key(s: &str) -> ArtifactKey {
        ArtifactKey::new(s).unwrap()
    }

    #[test]
    fn conflict_message_names_keys() {
        let err = DeployError::Conflict {
            kind: ArtifactKind::Macro,
            keys: vec![key("latestNews"), key("siteMap")],
        };

        assert_eq!(
            err.to_string(),
            "The batch could not be deployed as it contains macros that already exist: latestNews, siteMap"
        );
        assert!(err.is_conflict());
        assert!(err.before_mutation());
    }

    #[test]
    fn aborted_message_includes_rollback() {
        let store_err = StoreError::Rejected {
            operation: StoreOperation::Create,
            kind: ArtifactKind::Script,
            key: "c.js".to_string(),
            reason: "disk full".to_string(),
        };
        let err = DeployError::Aborted {
            kind: ArtifactKind::Script,
            phase: Phase::Create,
            key: Some(key("c.js")),
            cause: StepError::Store(store_err.clone()),
            rollback: RollbackReport {
                deleted: vec![key("b.js"), key("a.js")],
                failures: vec![],
            },
        };

        let msg = err.to_string();
        assert!(msg.contains("create phase at 'c.js'"));
        assert!(msg.contains("rolled back 2 artifact(s)"));
        assert_eq!(err.store_error(), Some(&store_err));
        assert!(!err.before_mutation());
    }

    #[test]
    fn rollback_report_lists_leftovers() {
        let report = RollbackReport {
            deleted: vec![key("a")],
            failures: vec![RollbackFailure {
                key: key("b"),
                error: StoreError::Io("gone".to_string()),
            }],
        };

        assert!(!report.is_clean());
        assert_eq!(report.leftovers(), vec![&key("b")]);
        assert!(report.to_string().contains("could not be removed: b"));
    }
}
