//! Read-only store inspection: list and show

use anyhow::{Context, Result};
use serde::Serialize;

use super::output::Output;
use crate::domain::{
    Artifact, ArtifactKey, ArtifactKind, ContentType, DataType, Macro, PartialView, Script,
    Stylesheet, Template,
};
use crate::storage::{ArtifactStore, FileStore, Project, StoreError};

#[derive(Debug, Serialize)]
struct Summary {
    key: String,
    id: Option<String>,
    updated_at: Option<String>,
}

fn summaries<A: Artifact>(store: &FileStore) -> Result<Vec<Summary>, StoreError> {
    let artifacts: Vec<A> = store.list_all()?;
    Ok(artifacts
        .iter()
        .map(|a| Summary {
            key: a.key().to_string(),
            id: a.id().map(|id| id.to_string()),
            updated_at: a.meta().updated_at.map(|t| t.to_rfc3339()),
        })
        .collect())
}

fn find<A: Artifact>(store: &FileStore, key: &ArtifactKey) -> Result<Option<serde_json::Value>> {
    let found: Option<A> = store.find_by_key(key)?;
    found
        .map(|artifact| serde_json::to_value(&artifact))
        .transpose()
        .context("Failed to serialize artifact")
}

/// Lists stored artifacts of one kind
pub fn list(output: &Output, kind: ArtifactKind) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.store()?;
    output.verbose_ctx("list", &format!("Reading {} from {}", kind.plural(), store.dir().display()));

    let items = match kind {
        ArtifactKind::ContentType => summaries::<ContentType>(&store),
        ArtifactKind::DataType => summaries::<DataType>(&store),
        ArtifactKind::Template => summaries::<Template>(&store),
        ArtifactKind::Macro => summaries::<Macro>(&store),
        ArtifactKind::Script => summaries::<Script>(&store),
        ArtifactKind::Stylesheet => summaries::<Stylesheet>(&store),
        ArtifactKind::PartialView => summaries::<PartialView>(&store),
    }?;

    if output.is_json() {
        output.data(&items);
    } else if items.is_empty() {
        println!("No {} deployed", kind.plural());
    } else {
        println!("{:<12} KEY", "ID");
        for item in &items {
            println!("{:<12} {}", item.id.as_deref().unwrap_or("-"), item.key);
        }
    }
    Ok(())
}

/// Shows one stored artifact as JSON
pub fn show(output: &Output, kind: ArtifactKind, key: &str) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.store()?;
    let key = ArtifactKey::new(key)?;

    let found = match kind {
        ArtifactKind::ContentType => find::<ContentType>(&store, &key),
        ArtifactKind::DataType => find::<DataType>(&store, &key),
        ArtifactKind::Template => find::<Template>(&store, &key),
        ArtifactKind::Macro => find::<Macro>(&store, &key),
        ArtifactKind::Script => find::<Script>(&store, &key),
        ArtifactKind::Stylesheet => find::<Stylesheet>(&store, &key),
        ArtifactKind::PartialView => find::<PartialView>(&store, &key),
    }?;

    match found {
        Some(artifact) => {
            output.data(&artifact);
            Ok(())
        }
        None => anyhow::bail!("{} '{}' not found", kind, key),
    }
}
