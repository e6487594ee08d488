//! Reference graph for artifacts of one kind
//!
//! Used to reject inheritance cycles (template masters, content type
//! compositions) among the artifacts of a batch before links are persisted.
//! Uses petgraph for graph operations.

use petgraph::algo::{is_cyclic_directed, kosaraju_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use thiserror::Error;

use super::id::{ArtifactId, ArtifactKey};

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Reference cycle detected between: {}", format_keys(.0))]
    CycleDetected(Vec<ArtifactKey>),

    #[error("Self-reference not allowed: {0}")]
    SelfReference(ArtifactKey),
}

fn format_keys(keys: &[ArtifactKey]) -> String {
    keys.iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Directed graph of "A references B" edges
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    graph: DiGraph<ArtifactKey, ()>,

    /// Map from artifact ID to node index
    node_map: HashMap<ArtifactId, NodeIndex>,
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Adds an artifact to the graph
    pub fn add_artifact(&mut self, id: ArtifactId, key: ArtifactKey) {
        if !self.node_map.contains_key(&id) {
            let idx = self.graph.add_node(key);
            self.node_map.insert(id, idx);
        }
    }

    /// Adds an edge `from -> to`
    ///
    /// Returns `Ok(false)` when `to` is not part of the graph: artifacts
    /// outside the batch cannot point back into it, so they never close a
    /// cycle.
    pub fn add_reference(&mut self, from: &ArtifactId, to: &ArtifactId) -> Result<bool, GraphError> {
        let Some(&from_idx) = self.node_map.get(from) else {
            return Ok(false);
        };

        if from == to {
            let key = self.graph[from_idx].clone();
            return Err(GraphError::SelfReference(key));
        }

        let Some(&to_idx) = self.node_map.get(to) else {
            return Ok(false);
        };

        self.graph.update_edge(from_idx, to_idx, ());
        Ok(true)
    }

    /// Fails with the members of one cycle if the graph is cyclic
    pub fn check_acyclic(&self) -> Result<(), GraphError> {
        if !is_cyclic_directed(&self.graph) {
            return Ok(());
        }

        let cycle = kosaraju_scc(&self.graph)
            .into_iter()
            .find(|component| component.len() > 1)
            .unwrap_or_default();

        let mut keys: Vec<ArtifactKey> = cycle
            .into_iter()
            .map(|idx| self.graph[idx].clone())
            .collect();
        keys.sort();

        Err(GraphError::CycleDetected(keys))
    }

    /// Returns the number of artifacts in the graph
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArtifactKind;
    use chrono::Utc;

    fn node(graph: &mut ReferenceGraph, key: &str) -> ArtifactId {
        let key = ArtifactKey::new(key).unwrap();
        let id = ArtifactId::generate(ArtifactKind::Template, &key, Utc::now());
        graph.add_artifact(id.clone(), key);
        id
    }

    #[test]
    fn empty_graph() {
        let graph = ReferenceGraph::new();
        assert!(graph.is_empty());
        assert!(graph.check_acyclic().is_ok());
    }

    #[test]
    fn chain_is_acyclic() {
        let mut graph = ReferenceGraph::new();
        let a = node(&mut graph, "a");
        let b = node(&mut graph, "b");
        let c = node(&mut graph, "c");

        assert!(graph.add_reference(&c, &b).unwrap());
        assert!(graph.add_reference(&b, &a).unwrap());

        assert_eq!(graph.len(), 3);
        assert!(graph.check_acyclic().is_ok());
    }

    #[test]
    fn cycle_detection() {
        let mut graph = ReferenceGraph::new();
        let a = node(&mut graph, "a");
        let b = node(&mut graph, "b");
        let c = node(&mut graph, "c");
        let d = node(&mut graph, "d");

        graph.add_reference(&a, &b).unwrap();
        graph.add_reference(&b, &c).unwrap();
        graph.add_reference(&c, &a).unwrap();
        graph.add_reference(&d, &a).unwrap();

        let err = graph.check_acyclic().unwrap_err();
        let expected: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|k| ArtifactKey::new(*k).unwrap())
            .collect();
        assert_eq!(err, GraphError::CycleDetected(expected));
    }

    #[test]
    fn self_reference_rejected() {
        let mut graph = ReferenceGraph::new();
        let a = node(&mut graph, "a");

        let result = graph.add_reference(&a, &a);
        assert!(matches!(result, Err(GraphError::SelfReference(_))));
    }

    #[test]
    fn references_outside_batch_are_ignored() {
        let mut graph = ReferenceGraph::new();
        let a = node(&mut graph, "a");
        let outside = ArtifactId::generate(
            ArtifactKind::Template,
            &ArtifactKey::new("existing").unwrap(),
            Utc::now(),
        );

        assert!(!graph.add_reference(&a, &outside).unwrap());
        assert!(graph.check_acyclic().is_ok());
    }
}
