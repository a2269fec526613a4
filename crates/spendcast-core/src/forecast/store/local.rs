//! Filesystem artifact backend
//!
//! Each artifact is `<dir>/<storage_key>.json`. Writes go to a temp file in
//! the same directory which is then renamed over the old file, so readers
//! see either the previous artifact or the new one.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::ModelArtifactStore;
use crate::error::{Error, Result};
use crate::forecast::regression::ModelArtifact;

pub struct LocalArtifactStore {
    dir: PathBuf,
}

impl LocalArtifactStore {
    /// Create a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();

        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| {
                Error::Storage(format!(
                    "Failed to create artifact directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
            info!("Created artifact directory: {}", dir.display());
        }

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn artifact_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl ModelArtifactStore for LocalArtifactStore {
    fn name(&self) -> &str {
        "local"
    }

    fn get(&self, key: &str) -> Result<Option<ModelArtifact>> {
        let path = self.artifact_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, artifact: &ModelArtifact) -> Result<()> {
        let path = self.artifact_path(key);

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut tmp, artifact)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path)?;

        debug!("Wrote artifact: {}", path.display());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        match fs::remove_file(self.artifact_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
