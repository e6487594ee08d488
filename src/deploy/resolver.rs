//! Reference resolution
//!
//! Turns identifier lists from definitions into store IDs. Unknown
//! identifiers are dropped rather than failing, but every drop is returned
//! alongside the resolved references so callers can see partial results.
//!
//! Positions are the index of the identifier in the original list, so
//! `"a,missing,b"` resolves to `a@0` and `b@2`. Empty segments are skipped
//! but still take up a position.

use std::marker::PhantomData;

use serde::Serialize;

use crate::domain::{Artifact, ArtifactId, ArtifactKey};
use crate::storage::{ArtifactStore, StoreError};

/// An identifier that resolved to a stored artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRef {
    pub key: ArtifactKey,
    pub id: ArtifactId,
    pub position: usize,
}

/// Outcome of resolving one identifier list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub resolved: Vec<ResolvedRef>,
    pub dropped: Vec<String>,
}

impl Resolution {
    /// True if nothing was dropped
    pub fn is_complete(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// Splits a comma list into trimmed, non-empty segments with their positions
pub fn split_identifiers(list: &str) -> impl Iterator<Item = (usize, &str)> {
    list.split(',')
        .map(str::trim)
        .enumerate()
        .filter(|(_, segment)| !segment.is_empty())
}

/// Resolves identifiers of kind `A` against a store
pub struct ReferenceResolver<'s, S, A> {
    store: &'s S,
    _kind: PhantomData<fn() -> A>,
}

impl<'s, S, A> ReferenceResolver<'s, S, A>
where
    A: Artifact,
    S: ArtifactStore<A>,
{
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            _kind: PhantomData,
        }
    }

    /// Resolves a comma-separated identifier list
    pub fn resolve(&self, list: &str) -> Result<Resolution, StoreError> {
        let mut resolution = Resolution::default();
        self.resolve_into(list, 0, &mut resolution)?;
        Ok(resolution)
    }

    /// Resolves several lists as if they were joined by commas
    pub fn resolve_all<T: AsRef<str>>(&self, lists: &[T]) -> Result<Resolution, StoreError> {
        let mut resolution = Resolution::default();
        let mut offset = 0;
        for list in lists {
            offset += self.resolve_into(list.as_ref(), offset, &mut resolution)?;
        }
        Ok(resolution)
    }

    /// Resolves a single identifier; commas are part of the identifier
    pub fn resolve_one(&self, identifier: &str) -> Result<Resolution, StoreError> {
        let mut resolution = Resolution::default();
        let identifier = identifier.trim();
        if !identifier.is_empty() {
            self.lookup(identifier, 0, &mut resolution)?;
        }
        Ok(resolution)
    }

    /// Returns the number of positions `list` occupies
    fn resolve_into(
        &self,
        list: &str,
        offset: usize,
        resolution: &mut Resolution,
    ) -> Result<usize, StoreError> {
        for (position, identifier) in split_identifiers(list) {
            self.lookup(identifier, offset + position, resolution)?;
        }
        Ok(list.split(',').count())
    }

    fn lookup(
        &self,
        identifier: &str,
        position: usize,
        resolution: &mut Resolution,
    ) -> Result<(), StoreError> {
        // Non-empty after trimming, so always a valid key
        let Ok(key) = ArtifactKey::new(identifier) else {
            return Ok(());
        };

        match self.store.find_by_key(&key)? {
            Some(artifact) => {
                let id = artifact.id().cloned().ok_or_else(|| {
                    StoreError::Corrupt(format!("{} '{}' has no id", A::KIND, key))
                })?;
                resolution.resolved.push(ResolvedRef { key, id, position });
            }
            None => resolution.dropped.push(identifier.to_string()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtifactKind, Template};
    use crate::storage::{MemoryStore, StoreOperation};

    fn key(s: &str) -> ArtifactKey {
        ArtifactKey::new(s).unwrap()
    }

    fn store_with(aliases: &[&str]) -> (MemoryStore, Vec<Template>) {
        let store = MemoryStore::new();
        let created = aliases
            .iter()
            .map(|a| store.create(Template::new(*a, key(a), "")).unwrap())
            .collect();
        (store, created)
    }

    #[test]
    fn keeps_original_positions() {
        let (store, created) = store_with(&["a", "b"]);
        let resolver = ReferenceResolver::<_, Template>::new(&store);

        let resolution = resolver.resolve("a,missing,b").unwrap();

        let positions: Vec<_> = resolution
            .resolved
            .iter()
            .map(|r| (r.key.as_str(), r.position))
            .collect();
        assert_eq!(positions, vec![("a", 0), ("b", 2)]);
        assert_eq!(resolution.resolved[1].id, created[1].id().cloned().unwrap());
        assert_eq!(resolution.dropped, vec!["missing".to_string()]);
        assert!(!resolution.is_complete());
    }

    #[test]
    fn trims_and_skips_empty_segments() {
        let (store, _) = store_with(&["a", "b"]);
        let resolver = ReferenceResolver::<_, Template>::new(&store);

        let resolution = resolver.resolve(" a , ,b,").unwrap();

        let positions: Vec<_> = resolution.resolved.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![0, 2]);
        assert!(resolution.is_complete());
        assert_eq!(store.count(StoreOperation::Lookup), 2);
    }

    #[test]
    fn empty_list_resolves_nothing() {
        let (store, _) = store_with(&[]);
        let resolver = ReferenceResolver::<_, Template>::new(&store);

        assert_eq!(resolver.resolve("").unwrap(), Resolution::default());
        assert!(store.journal().is_empty());
    }

    #[test]
    fn resolve_all_continues_positions() {
        let (store, _) = store_with(&["a", "b", "c"]);
        let resolver = ReferenceResolver::<_, Template>::new(&store);

        let resolution = resolver.resolve_all(&["a,b", "x", "c"]).unwrap();

        let positions: Vec<_> = resolution
            .resolved
            .iter()
            .map(|r| (r.key.as_str(), r.position))
            .collect();
        assert_eq!(positions, vec![("a", 0), ("b", 1), ("c", 3)]);
        assert_eq!(resolution.dropped, vec!["x".to_string()]);
    }

    #[test]
    fn resolve_one_does_not_split() {
        let (store, _) = store_with(&["a"]);
        let resolver = ReferenceResolver::<_, Template>::new(&store);

        assert_eq!(resolver.resolve_one(" a ").unwrap().resolved[0].key, key("a"));
        assert_eq!(resolver.resolve_one("a,b").unwrap().dropped, vec!["a,b".to_string()]);
        assert!(resolver.resolve_one("  ").unwrap().resolved.is_empty());
    }

    #[test]
    fn lookup_failure_propagates() {
        let (store, _) = store_with(&["a"]);
        store.fail_on(StoreOperation::Lookup, ArtifactKind::Template, "a");
        let resolver = ReferenceResolver::<_, Template>::new(&store);

        assert!(resolver.resolve("a").is_err());
    }

    #[test]
    fn split_reports_positions() {
        let segments: Vec<_> = split_identifiers("x,,y").collect();
        assert_eq!(segments, vec![(0, "x"), (2, "y")]);
    }
}
