//! JSONL file store
//!
//! A local stand-in for the CMS backend: each artifact kind lives in
//! `{store-dir}/{kind}s.jsonl` with one JSON object per line, in creation
//! order. Uses file locking for concurrent access safety.

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use fs2::FileExt;

use super::store::{assign_new_id, ArtifactStore, StoreError};
use crate::domain::{Artifact, ArtifactKey, ArtifactKind};

/// File-backed store for all artifact kinds
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a new store rooted at the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file holding artifacts of `kind`
    pub fn path_for(&self, kind: ArtifactKind) -> PathBuf {
        self.dir.join(format!("{}s.jsonl", kind.as_str()))
    }

    /// Reads all artifacts of one kind
    fn read_all<A: Artifact>(&self) -> Result<Vec<A>, StoreError> {
        let path = self.path_for(A::KIND);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)
            .with_context(|| format!("Failed to open store file: {}", path.display()))?;

        // Acquire shared lock for reading
        file.lock_shared()
            .context("Failed to acquire read lock on store file")?;

        let reader = BufReader::new(&file);
        let mut artifacts = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let artifact: A = serde_json::from_str(&line).map_err(|e| {
                StoreError::Corrupt(format!(
                    "{} line {}: {}",
                    path.display(),
                    line_num + 1,
                    e
                ))
            })?;

            artifacts.push(artifact);
        }

        // Lock is released when file is dropped
        Ok(artifacts)
    }

    /// Writes all artifacts of one kind (full rewrite)
    fn write_all<A: Artifact>(&self, artifacts: &[A]) -> Result<(), StoreError> {
        let path = self.path_for(A::KIND);

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory: {}", self.dir.display()))?;

        // Write to temp file first
        let temp_path = path.with_extension("jsonl.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            // Acquire exclusive lock
            file.lock_exclusive()
                .context("Failed to acquire write lock on store file")?;

            let mut writer = BufWriter::new(&file);

            for artifact in artifacts {
                let line = serde_json::to_string(artifact)
                    .with_context(|| format!("Failed to serialize {} '{}'", A::KIND, artifact.key()))?;
                writeln!(writer, "{}", line).context("Failed to write artifact")?;
            }

            writer.flush().context("Failed to flush store file")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }

    fn position<A: Artifact>(artifacts: &[A], key: &ArtifactKey) -> Option<usize> {
        artifacts.iter().position(|a| a.key() == key)
    }
}

impl<A: Artifact> ArtifactStore<A> for FileStore {
    fn find_by_key(&self, key: &ArtifactKey) -> Result<Option<A>, StoreError> {
        let artifacts: Vec<A> = self.read_all()?;
        Ok(artifacts.into_iter().find(|a| a.key() == key))
    }

    fn create(&self, mut artifact: A) -> Result<A, StoreError> {
        let mut artifacts: Vec<A> = self.read_all()?;

        if Self::position(&artifacts, artifact.key()).is_some() {
            return Err(StoreError::AlreadyExists {
                kind: A::KIND,
                key: artifact.key().clone(),
            });
        }

        assign_new_id(&mut artifact, Utc::now(), |id| {
            artifacts.iter().any(|a| a.id() == Some(id))
        });

        artifacts.push(artifact.clone());
        self.write_all(&artifacts)?;

        Ok(artifact)
    }

    fn update(&self, artifact: &A) -> Result<A, StoreError> {
        let mut artifacts: Vec<A> = self.read_all()?;

        let idx = Self::position(&artifacts, artifact.key()).ok_or_else(|| StoreError::NotFound {
            kind: A::KIND,
            key: artifact.key().clone(),
        })?;

        let mut updated = artifact.clone();
        // The stored identity wins over whatever the caller holds
        *updated.meta_mut() = artifacts[idx].meta().clone();
        updated.meta_mut().touch(Utc::now());

        artifacts[idx] = updated.clone();
        self.write_all(&artifacts)?;

        Ok(updated)
    }

    fn delete(&self, artifact: &A) -> Result<(), StoreError> {
        let mut artifacts: Vec<A> = self.read_all()?;

        let idx = Self::position(&artifacts, artifact.key()).ok_or_else(|| StoreError::NotFound {
            kind: A::KIND,
            key: artifact.key().clone(),
        })?;

        artifacts.remove(idx);
        self.write_all(&artifacts)
    }

    fn list_keys(&self) -> Result<BTreeSet<ArtifactKey>, StoreError> {
        let artifacts: Vec<A> = self.read_all()?;
        Ok(artifacts.iter().map(|a| a.key().clone()).collect())
    }

    fn list_all(&self) -> Result<Vec<A>, StoreError> {
        self.read_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Script, Template};
    use tempfile::TempDir;

    fn key(s: &str) -> ArtifactKey {
        ArtifactKey::new(s).unwrap()
    }

    fn template(alias: &str) -> Template {
        Template::new(alias.to_uppercase(), key(alias), "<html/>")
    }

    #[test]
    fn read_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("store"));

        let keys = ArtifactStore::<Template>::list_keys(&store).unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn create_assigns_id_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        let created = store.create(template("master")).unwrap();
        assert!(created.id().is_some());
        assert!(created.meta.created_at.is_some());

        let found: Option<Template> = store.find_by_key(&key("master")).unwrap();
        assert_eq!(found.unwrap().id(), created.id());
        assert!(store.path_for(ArtifactKind::Template).exists());
    }

    #[test]
    fn create_rejects_existing_key() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        store.create(template("master")).unwrap();
        let result = store.create(template("master"));

        assert!(matches!(result, Err(StoreError::AlreadyExists { .. })));
    }

    #[test]
    fn kinds_are_separate_files() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        store.create(template("site")).unwrap();
        store.create(Script::new(key("site"), "alert(1)")).unwrap();

        assert_eq!(ArtifactStore::<Template>::list_keys(&store).unwrap().len(), 1);
        assert_eq!(ArtifactStore::<Script>::list_keys(&store).unwrap().len(), 1);
        assert!(store.path_for(ArtifactKind::Script).ends_with("scripts.jsonl"));
    }

    #[test]
    fn update_keeps_identity() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        let created = store.create(template("master")).unwrap();

        let mut changed = created.clone();
        changed.content = "<body/>".to_string();
        changed.meta.id = None;
        let updated = store.update(&changed).unwrap();

        assert_eq!(updated.id(), created.id());
        assert_eq!(updated.meta.created_at, created.meta.created_at);

        let found: Template = store.find_by_key(&key("master")).unwrap().unwrap();
        assert_eq!(found.content, "<body/>");
    }

    #[test]
    fn update_missing_fails() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        let result = store.update(&template("ghost"));
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn delete_removes_artifact() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        let a = store.create(template("a")).unwrap();
        store.create(template("b")).unwrap();

        store.delete(&a).unwrap();

        let keys = ArtifactStore::<Template>::list_keys(&store).unwrap();
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec![key("b")]);
        assert!(matches!(store.delete(&a), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn list_all_keeps_creation_order() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        for alias in ["zeta", "alpha", "mid"] {
            store.create(template(alias)).unwrap();
        }

        let all: Vec<Template> = store.list_all().unwrap();
        let aliases: Vec<_> = all.iter().map(|t| t.alias.as_str()).collect();
        assert_eq!(aliases, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn corrupt_line_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        fs::write(store.path_for(ArtifactKind::Template), "{not json}\n").unwrap();

        let result = ArtifactStore::<Template>::list_keys(&store);
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn atomic_write() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        store.create(template("master")).unwrap();

        // Temp file should not exist after write
        let temp_path = store.path_for(ArtifactKind::Template).with_extension("jsonl.tmp");
        assert!(!temp_path.exists());
    }
}
