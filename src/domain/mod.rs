//! Domain models for schemadeploy
//!
//! Artifact kinds, keys, identifiers and the seven artifact models, without
//! any I/O concerns.

mod alias;
mod artifact;
mod content_type;
mod data_type;
mod file_artifact;
mod graph;
mod id;
mod macros;
mod template;

pub use alias::safe_alias;
pub use artifact::{Artifact, StoreMeta};
pub use content_type::{ContentType, ContentTypeSort, PropertyType};
pub use data_type::{DataType, DatabaseType, PreValue};
pub use file_artifact::{PartialView, Script, Stylesheet};
pub use graph::{GraphError, ReferenceGraph};
pub use id::{ArtifactId, ArtifactKey, ArtifactKind, IdError};
pub use macros::{Macro, MacroProperty};
pub use template::Template;
