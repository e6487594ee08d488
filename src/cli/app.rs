//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{deploy_cmd, inspect};
use crate::domain::ArtifactKind;
use crate::storage::{Config, Project};

/// Environment variable holding a `tracing` filter directive
pub const LOG_ENV: &str = "SCHEMADEPLOY_LOG";

#[derive(Parser)]
#[command(name = "schemadeploy")]
#[command(author, version, about = "Deploy CMS schema artifacts from manifests, all or nothing")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new schemadeploy project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Deploy a manifest, one batch per artifact kind
    ///
    /// Examples:
    ///   schemadeploy deploy schema.yaml
    ///   schemadeploy deploy schema.yaml --kind template --kind content-type
    ///   schemadeploy deploy schema.yaml --dry-run
    Deploy {
        /// Manifest file (YAML, JSON or TOML)
        manifest: PathBuf,

        /// Only deploy these kinds
        #[arg(long, short = 'k')]
        kind: Vec<ArtifactKind>,

        /// Run against a copy of the store and report what would happen
        #[arg(long)]
        dry_run: bool,
    },

    /// Check a manifest for duplicate and already existing keys
    Check {
        /// Manifest file (YAML, JSON or TOML)
        manifest: PathBuf,

        /// Only check these kinds
        #[arg(long, short = 'k')]
        kind: Vec<ArtifactKind>,
    },

    /// Remove the artifacts a manifest defines, best effort
    Retract {
        /// Manifest file (YAML, JSON or TOML)
        manifest: PathBuf,

        /// Only retract these kinds
        #[arg(long, short = 'k')]
        kind: Vec<ArtifactKind>,
    },

    /// List stored artifacts of one kind
    List {
        /// Artifact kind (e.g. content-type, template)
        kind: ArtifactKind,
    },

    /// Show one stored artifact
    Show {
        /// Artifact kind (e.g. content-type, template)
        kind: ArtifactKind,

        /// Artifact key (alias, name or path, depending on kind)
        key: String,
    },
}

/// Installs the stderr log subscriber
///
/// `SCHEMADEPLOY_LOG` wins; otherwise `--verbose` shows debug events from
/// this crate and everything else stays at warnings.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "schemadeploy=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn resolve_format(flag: Option<OutputFormat>) -> OutputFormat {
    flag.unwrap_or_else(|| {
        Config::load()
            .map(|config| config.global.default_format.into())
            .unwrap_or_default()
    })
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = Output::new(resolve_format(cli.format), cli.verbose);

    output.verbose("schemadeploy starting");

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created workspace at: {}", project.workspace_dir().display()),
            );
            output.success(&format!(
                "Initialized schemadeploy project at {}",
                project.root().display()
            ));
        }

        Commands::Deploy {
            manifest,
            kind,
            dry_run,
        } => deploy_cmd::deploy(&output, &manifest, &kind, dry_run)?,

        Commands::Check { manifest, kind } => deploy_cmd::check(&output, &manifest, &kind)?,

        Commands::Retract { manifest, kind } => deploy_cmd::retract(&output, &manifest, &kind)?,

        Commands::List { kind } => inspect::list(&output, kind)?,

        Commands::Show { kind, key } => inspect::show(&output, kind, &key)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}
