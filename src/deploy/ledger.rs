//! Rollback ledger
//!
//! Records every artifact the current batch created, in creation order.
//! Owned by one deploy run and dropped when it ends.

use crate::domain::{Artifact, ArtifactId, ArtifactKey};

#[derive(Debug)]
pub struct RollbackLedger<A> {
    entries: Vec<A>,
}

impl<A: Artifact> RollbackLedger<A> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a freshly created artifact
    pub fn record(&mut self, created: A) {
        self.entries.push(created);
    }

    /// Replaces the entry at `index` with its persisted update
    pub fn replace(&mut self, index: usize, updated: A) {
        if let Some(slot) = self.entries.get_mut(index) {
            *slot = updated;
        }
    }

    pub fn entries(&self) -> &[A] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key and ID of every entry, in creation order
    pub fn deployed(&self) -> Vec<(ArtifactKey, Option<ArtifactId>)> {
        self.entries
            .iter()
            .map(|a| (a.key().clone(), a.id().cloned()))
            .collect()
    }

    /// Consumes the ledger, newest entry first
    pub fn into_rollback_order(self) -> impl Iterator<Item = A> {
        self.entries.into_iter().rev()
    }
}

impl<A: Artifact> Default for RollbackLedger<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Script;

    fn script(name: &str) -> Script {
        Script::new(ArtifactKey::new(name).unwrap(), "")
    }

    #[test]
    fn rollback_order_is_newest_first() {
        let mut ledger = RollbackLedger::new();
        ledger.record(script("a.js"));
        ledger.record(script("b.js"));
        ledger.record(script("c.js"));

        let order: Vec<_> = ledger
            .into_rollback_order()
            .map(|s| s.name.to_string())
            .collect();
        assert_eq!(order, vec!["c.js", "b.js", "a.js"]);
    }

    #[test]
    fn replace_keeps_position() {
        let mut ledger = RollbackLedger::new();
        ledger.record(script("a.js"));
        ledger.record(script("b.js"));

        let mut updated = script("a.js");
        updated.content = "changed".to_string();
        ledger.replace(0, updated);

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.entries()[0].content, "changed");
        assert_eq!(ledger.entries()[1].name.as_str(), "b.js");
    }
}
