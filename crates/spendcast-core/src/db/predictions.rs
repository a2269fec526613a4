//! Prediction model metadata operations

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::{format_datetime, parse_datetime, Database};
use crate::error::Result;
use crate::models::PredictionModel;

impl Database {
    /// Get the metadata row for a user's live model
    pub fn get_prediction_model(&self, user_id: i64) -> Result<Option<PredictionModel>> {
        let conn = self.conn()?;
        let model = conn
            .query_row(
                r#"
                SELECT id, user_id, storage_key, sample_count, created_at, updated_at, last_trained
                FROM prediction_models
                WHERE user_id = ?
                "#,
                params![user_id],
                |row| {
                    let created_at: String = row.get(4)?;
                    let updated_at: String = row.get(5)?;
                    let last_trained: String = row.get(6)?;
                    Ok(PredictionModel {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        storage_key: row.get(2)?,
                        sample_count: row.get(3)?,
                        created_at: parse_datetime(&created_at),
                        updated_at: parse_datetime(&updated_at),
                        last_trained: parse_datetime(&last_trained),
                    })
                },
            )
            .optional()?;
        Ok(model)
    }

    /// Create or update the metadata row for a user's model
    ///
    /// There is at most one row per user; a retrain updates it in place and
    /// keeps the original `created_at`.
    pub fn upsert_prediction_model(
        &self,
        user_id: i64,
        storage_key: &str,
        sample_count: usize,
        trained_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn()?;
        let ts = format_datetime(&trained_at);

        conn.execute(
            r#"
            INSERT INTO prediction_models (user_id, storage_key, sample_count, created_at, updated_at, last_trained)
            VALUES (?1, ?2, ?3, ?4, ?4, ?4)
            ON CONFLICT(user_id) DO UPDATE SET
                storage_key = excluded.storage_key,
                sample_count = excluded.sample_count,
                updated_at = excluded.updated_at,
                last_trained = excluded.last_trained
            "#,
            params![user_id, storage_key, sample_count as i64, ts],
        )?;
        Ok(())
    }

    /// Remove a user's model metadata
    pub fn delete_prediction_model(&self, user_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM prediction_models WHERE user_id = ?",
            params![user_id],
        )?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_upsert_keeps_single_row() {
        let db = Database::in_memory().unwrap();
        let user = db.upsert_user("alice").unwrap();
        assert!(db.get_prediction_model(user).unwrap().is_none());

        let first = Utc::now() - Duration::days(1);
        db.upsert_prediction_model(user, "expense_model_1", 3, first)
            .unwrap();
        let created = db.get_prediction_model(user).unwrap().unwrap();
        assert_eq!(created.sample_count, 3);
        assert_eq!(created.created_at, created.last_trained);

        let second = Utc::now();
        db.upsert_prediction_model(user, "expense_model_1", 4, second)
            .unwrap();
        let updated = db.get_prediction_model(user).unwrap().unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.sample_count, 4);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.last_trained > created.last_trained);

        let conn = db.conn().unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM prediction_models", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_delete_prediction_model() {
        let db = Database::in_memory().unwrap();
        let user = db.upsert_user("alice").unwrap();
        db.upsert_prediction_model(user, "k", 3, Utc::now()).unwrap();
        assert!(db.delete_prediction_model(user).unwrap());
        assert!(db.get_prediction_model(user).unwrap().is_none());
    }
}
