//! In-process artifact backend

use std::collections::HashMap;
use std::sync::RwLock;

use super::ModelArtifactStore;
use crate::error::{Error, Result};
use crate::forecast::regression::ModelArtifact;

#[derive(Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<HashMap<String, ModelArtifact>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Storage("Memory artifact store poisoned".into())
}

impl ModelArtifactStore for MemoryArtifactStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<ModelArtifact>> {
        Ok(self.artifacts.read().map_err(poisoned)?.get(key).copied())
    }

    fn put(&self, key: &str, artifact: &ModelArtifact) -> Result<()> {
        self.artifacts
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), *artifact);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.artifacts.write().map_err(poisoned)?.remove(key).is_some())
    }
}
