//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init [path]` | Create `.schemadeploy/` with default config and store |
//! | `deploy <manifest>` | Deploy each section as one all-or-nothing batch |
//! | `check <manifest>` | Report duplicate and already existing keys |
//! | `retract <manifest>` | Remove what a manifest defines, best effort |
//! | `list <kind>` | List stored artifacts |
//! | `show <kind> <key>` | Print one stored artifact |
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! The default can be changed with `default_format` in the global config.
//!
//! ## Logging
//!
//! Events go to stderr. `--verbose` (or `-v`) enables debug events;
//! `SCHEMADEPLOY_LOG` takes any `tracing` filter directive:
//! ```bash
//! SCHEMADEPLOY_LOG=schemadeploy=debug schemadeploy deploy schema.yaml
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod deploy_cmd;
mod inspect;
mod output;

pub use app::{run, Cli, Commands, LOG_ENV};
pub use output::{Output, OutputFormat};
