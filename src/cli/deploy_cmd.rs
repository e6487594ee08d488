//! Deploy, check and retract commands

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use super::output::Output;
use crate::deploy::{
    check_kind, deploy_manifest, retract_kind, selected_kinds, DeployError, DeployOptions,
    DeployReport, ManifestOutcome,
};
use crate::domain::ArtifactKind;
use crate::manifest::Manifest;
use crate::storage::{MemoryStore, Project};

fn load_manifest(output: &Output, path: &Path) -> Result<Manifest> {
    let manifest = Manifest::load(path)
        .with_context(|| format!("Failed to load manifest {}", path.display()))?;

    for kind in manifest.kinds() {
        output.verbose_ctx(
            "manifest",
            &format!("{}: {} definition(s)", kind.plural(), manifest.count(kind)),
        );
    }
    Ok(manifest)
}

fn kind_names(kinds: &[ArtifactKind]) -> Vec<&'static str> {
    kinds.iter().map(|k| k.as_str()).collect()
}

/// Deploys every selected section of a manifest
pub fn deploy(output: &Output, path: &Path, filter: &[ArtifactKind], dry_run: bool) -> Result<()> {
    let project = Project::open_current()?;
    let manifest = load_manifest(output, path)?;

    let kinds = selected_kinds(&manifest, filter);
    if kinds.is_empty() {
        output.success("Nothing to deploy");
        return Ok(());
    }

    let options = DeployOptions::from(&project.config().project.deploy);
    output.verbose_ctx(
        "deploy",
        &format!(
            "kinds={:?} strategy={:?} strict={} dry_run={}",
            kind_names(&kinds),
            options.conflict_strategy,
            options.strict_references,
            dry_run
        ),
    );

    let store = project.store()?;
    let outcome = if dry_run {
        let snapshot =
            MemoryStore::snapshot_of(&store).context("Failed to copy the store for a dry run")?;
        deploy_manifest(&snapshot, &manifest, &kinds, &options)
    } else {
        deploy_manifest(&store, &manifest, &kinds, &options)
    };

    if output.is_json() {
        output.data(&outcome_json(&outcome, dry_run));
    } else {
        print_outcome(output, &outcome, dry_run);
    }

    match outcome.failure {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

fn print_report(output: &Output, report: &DeployReport, dry_run: bool) {
    let prefix = if dry_run { "Would deploy" } else { "Deployed" };
    output.success(&format!(
        "{} {} {} ({} linked)",
        prefix,
        report.deployed.len(),
        report.kind.plural(),
        report.updated
    ));

    for artifact in &report.deployed {
        let id = artifact
            .id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_default();
        output.row(&["  +", artifact.key.as_str(), &id]);
    }

    for dropped in &report.dropped {
        output.warn(&format!(
            "{} '{}': {} reference '{}' not found, left out",
            report.kind, dropped.owner, dropped.field, dropped.identifier
        ));
    }
}

fn print_outcome(output: &Output, outcome: &ManifestOutcome, dry_run: bool) {
    for report in &outcome.committed {
        print_report(output, report, dry_run);
    }

    if let Some(rollback) = outcome.failure.as_ref().and_then(DeployError::rollback) {
        output.verbose_ctx("deploy", &rollback.to_string());
        for failure in &rollback.failures {
            output.warn(&format!(
                "'{}' could not be rolled back: {}",
                failure.key, failure.error
            ));
        }
    }

    if !outcome.skipped.is_empty() {
        output.warn(&format!("Skipped: {}", kind_names(&outcome.skipped).join(", ")));
    }
}

fn failure_json(error: &DeployError) -> Value {
    let (rolled_back, leftovers) = match error.rollback() {
        Some(rollback) => (
            rollback.deleted.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            rollback.leftovers().iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        ),
        None => (Vec::new(), Vec::new()),
    };

    json!({
        "kind": error.kind(),
        "error": error.to_string(),
        "before_mutation": error.before_mutation(),
        "rolled_back": rolled_back,
        "leftovers": leftovers,
    })
}

fn outcome_json(outcome: &ManifestOutcome, dry_run: bool) -> Value {
    json!({
        "success": outcome.is_success(),
        "dry_run": dry_run,
        "committed": outcome.committed,
        "failure": outcome.failure.as_ref().map(failure_json),
        "skipped": outcome.skipped,
    })
}

/// Runs pre-flight for every selected section without writing
pub fn check(output: &Output, path: &Path, filter: &[ArtifactKind]) -> Result<()> {
    let project = Project::open_current()?;
    let manifest = load_manifest(output, path)?;
    let options = DeployOptions::from(&project.config().project.deploy);
    let store = project.store()?;

    let mut results = Vec::new();
    let mut blocked = 0;

    for kind in selected_kinds(&manifest, filter) {
        let result = match check_kind(&store, &manifest, kind, &options) {
            Ok(conflicts) if conflicts.is_empty() => {
                output.row(&["ok", kind.plural(), &manifest.count(kind).to_string()]);
                json!({ "kind": kind, "ok": true, "conflicts": [] })
            }
            Ok(conflicts) => {
                blocked += 1;
                let keys: Vec<_> = conflicts.iter().map(|k| k.as_str()).collect();
                output.row(&["conflict", kind.plural(), &keys.join(", ")]);
                json!({ "kind": kind, "ok": false, "conflicts": keys })
            }
            Err(error) => {
                blocked += 1;
                output.row(&["error", kind.plural(), &error.to_string()]);
                json!({ "kind": kind, "ok": false, "error": error.to_string() })
            }
        };
        results.push(result);
    }

    if output.is_json() {
        output.data(&json!({ "success": blocked == 0, "kinds": results }));
    }

    if blocked > 0 {
        anyhow::bail!("{} kind(s) cannot be deployed", blocked);
    }
    if !output.is_json() {
        output.success("No conflicts");
    }
    Ok(())
}

/// Removes everything the selected sections define, dependents first
pub fn retract(output: &Output, path: &Path, filter: &[ArtifactKind]) -> Result<()> {
    let project = Project::open_current()?;
    let manifest = load_manifest(output, path)?;
    let store = project.store()?;

    let mut reports = Vec::new();
    let mut failures = 0;

    for kind in selected_kinds(&manifest, filter).into_iter().rev() {
        let report = retract_kind(&store, &manifest, kind)?;
        failures += report.failures.len();

        if !output.is_json() {
            output.success(&format!(
                "Retracted {} {} ({} not found)",
                report.removed.len(),
                kind.plural(),
                report.missing.len()
            ));
            for failure in &report.failures {
                output.warn(&format!("'{}' could not be removed: {}", failure.key, failure.error));
            }
        }
        reports.push(report);
    }

    if output.is_json() {
        output.data(&json!({ "success": failures == 0, "kinds": reports }));
    }

    if failures > 0 {
        anyhow::bail!("{} artifact(s) could not be removed", failures);
    }
    Ok(())
}
