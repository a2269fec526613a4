//! Model artifact blob operations (backing store for `DatabaseArtifactStore`)

use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::Result;

impl Database {
    /// Write an artifact payload, replacing any previous one under the same key
    pub fn put_model_artifact(&self, storage_key: &str, payload: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO model_artifacts (storage_key, payload, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(storage_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
            params![storage_key, payload],
        )?;
        Ok(())
    }

    /// Read an artifact payload
    pub fn get_model_artifact(&self, storage_key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let payload = conn
            .query_row(
                "SELECT payload FROM model_artifacts WHERE storage_key = ?",
                params![storage_key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    pub fn delete_model_artifact(&self, storage_key: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM model_artifacts WHERE storage_key = ?",
            params![storage_key],
        )?;
        Ok(deleted > 0)
    }
}
