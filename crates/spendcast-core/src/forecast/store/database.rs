//! Artifact backend on the `model_artifacts` table

use super::ModelArtifactStore;
use crate::db::Database;
use crate::error::Result;
use crate::forecast::regression::ModelArtifact;

/// Stores artifacts as JSON payloads next to the ledger
pub struct DatabaseArtifactStore {
    db: Database,
}

impl DatabaseArtifactStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl ModelArtifactStore for DatabaseArtifactStore {
    fn name(&self) -> &str {
        "database"
    }

    fn get(&self, key: &str) -> Result<Option<ModelArtifact>> {
        match self.db.get_model_artifact(key)? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, artifact: &ModelArtifact) -> Result<()> {
        let payload = serde_json::to_string(artifact)?;
        self.db.put_model_artifact(key, &payload)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        self.db.delete_model_artifact(key)
    }
}
