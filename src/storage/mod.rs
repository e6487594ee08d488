//! # Storage Layer
//!
//! The store adapter boundary and its implementations, plus the local
//! project workspace and its configuration.
//!
//! ## Store Adapters
//!
//! | Store | Backing | Use |
//! |-------|---------|-----|
//! | [`FileStore`] | JSONL file per kind under `.schemadeploy/store/` | Real deployments |
//! | [`MemoryStore`] | In-process maps, fault injection, call journal | Dry runs and tests |
//!
//! Both implement [`ArtifactStore`] for all seven artifact kinds, which makes
//! them a [`SchemaStore`].
//!
//! ## Concurrency Safety
//!
//! - [`FileStore`] uses file locking (`fs2`) and atomic writes (temp file + rename)
//! - Nothing isolates two batches that touch overlapping keys
//!
//! ## Project Structure
//!
//! ```text
//! .schemadeploy/
//! ├── config.toml               # Project configuration
//! └── store/
//!     ├── content-types.jsonl
//!     ├── data-types.jsonl
//!     ├── templates.jsonl
//!     └── ...
//! ```

mod config;
mod jsonl;
mod memory;
mod project;
mod store;

pub use config::{Config, ConfigError, DeployConfig, GlobalConfig, OutputFormat, ProjectConfig, StoreConfig, WORKSPACE_DIR};
pub use jsonl::FileStore;
pub use memory::{JournalEntry, MemoryStore};
pub use project::{Project, ProjectError};
pub use store::{ArtifactStore, SchemaStore, StoreError, StoreOperation};
