//! Kind adapters for the seven artifact kinds

mod content_type;
mod data_type;
mod files;
mod macros;
mod template;

pub use content_type::ContentTypeAdapter;
pub use data_type::DataTypeAdapter;
pub use files::{PartialViewAdapter, ScriptAdapter, StylesheetAdapter};
pub use macros::MacroAdapter;
pub use template::TemplateAdapter;

use crate::deploy::error::StepError;
use crate::domain::{Artifact, ArtifactId, ArtifactKey, IdError, ReferenceGraph};

/// Key validation failure inside a step
fn invalid_key<A: Artifact>(raw: &str, error: IdError) -> StepError {
    StepError::validation(A::KIND, raw, error.to_string())
}

/// Rejects reference cycles among the artifacts of one linked batch
///
/// `edges` yields the in-kind references of an artifact. References to
/// artifacts outside the batch are ignored.
fn verify_acyclic<A, F>(linked: &[A], edges: F) -> Result<(), StepError>
where
    A: Artifact,
    F: Fn(&A) -> Vec<&ArtifactId>,
{
    let mut graph = ReferenceGraph::new();
    for artifact in linked {
        if let Some(id) = artifact.id() {
            graph.add_artifact(id.clone(), artifact.key().clone());
        }
    }

    let graph_error = |e| StepError::from_graph(A::KIND, e);
    for artifact in linked {
        let Some(from) = artifact.id() else {
            continue;
        };
        for to in edges(artifact) {
            graph.add_reference(from, to).map_err(graph_error)?;
        }
    }

    graph.check_acyclic().map_err(graph_error)
}

fn key_from(raw: &str) -> Result<ArtifactKey, IdError> {
    ArtifactKey::new(raw)
}
