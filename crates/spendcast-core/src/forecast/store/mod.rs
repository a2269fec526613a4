//! Per-user model persistence with pluggable artifact backends
//!
//! # Architecture
//!
//! - `ModelArtifactStore` trait defines where serialized artifacts live
//! - `DatabaseArtifactStore` keeps them in the `model_artifacts` table
//! - `LocalArtifactStore` writes one JSON file per user, swapped in atomically
//! - `MemoryArtifactStore` keeps them in process (tests, embedding)
//!
//! `ModelStore` pairs an artifact backend with the `prediction_models`
//! metadata table. A save writes the artifact first and the metadata row
//! second; the metadata row is what marks a user as trained.
//!
//! Storage key format: `expense_model_<user_id>`

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::Utc;
use tracing::{debug, error, info};

use super::regression::ModelArtifact;
use crate::config::{StoreBackend, StoreConfig};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::PredictionModel;

mod database;
mod local;
mod memory;

pub use database::DatabaseArtifactStore;
pub use local::LocalArtifactStore;
pub use memory::MemoryArtifactStore;

/// Storage backend for serialized model artifacts
pub trait ModelArtifactStore: Send + Sync {
    /// Human-readable name for this backend
    fn name(&self) -> &str;

    /// Fetch the artifact stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<ModelArtifact>>;

    /// Store an artifact under `key`, replacing any previous one
    fn put(&self, key: &str, artifact: &ModelArtifact) -> Result<()>;

    /// Remove the artifact under `key`; returns whether one existed
    fn delete(&self, key: &str) -> Result<bool>;
}

/// Artifact address for a user
pub fn storage_key(user_id: i64) -> String {
    format!("expense_model_{}", user_id)
}

/// A user's live model: coefficients plus metadata
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub artifact: ModelArtifact,
    pub metadata: PredictionModel,
}

/// Persists and retrieves one model per user
pub struct ModelStore {
    db: Database,
    artifacts: Box<dyn ModelArtifactStore>,
    locks: Mutex<HashMap<i64, Arc<RwLock<()>>>>,
}

impl ModelStore {
    pub fn new(db: Database, artifacts: Box<dyn ModelArtifactStore>) -> Self {
        Self {
            db,
            artifacts,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Build a store with the backend selected in config
    pub fn from_config(db: Database, config: &StoreConfig) -> Result<Self> {
        let artifacts: Box<dyn ModelArtifactStore> = match config.backend {
            StoreBackend::Database => Box::new(DatabaseArtifactStore::new(db.clone())),
            StoreBackend::Local => Box::new(LocalArtifactStore::new(config.artifact_dir())?),
        };
        Ok(Self::new(db, artifacts))
    }

    pub fn backend_name(&self) -> &str {
        self.artifacts.name()
    }

    /// Lock guarding one user's artifact + metadata pair
    fn user_lock(&self, user_id: i64) -> Result<Arc<RwLock<()>>> {
        let mut locks = self.lock_registry()?;
        Ok(locks.entry(user_id).or_default().clone())
    }

    fn lock_registry(&self) -> Result<MutexGuard<'_, HashMap<i64, Arc<RwLock<()>>>>> {
        self.locks
            .lock()
            .map_err(|_| Error::Storage("Model lock registry poisoned".into()))
    }

    /// Drop the user's registry entry unless another caller still holds it
    fn release_lock(&self, user_id: i64) -> Result<()> {
        let mut locks = self.lock_registry()?;
        if locks
            .get(&user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&user_id);
        }
        Ok(())
    }

    /// Persist a freshly trained artifact, replacing the user's previous model
    pub fn save(
        &self,
        user_id: i64,
        artifact: &ModelArtifact,
        sample_count: usize,
    ) -> Result<PredictionModel> {
        let key = storage_key(user_id);
        let lock = self.user_lock(user_id)?;
        let _guard = lock
            .write()
            .map_err(|_| Error::Storage(format!("Model lock poisoned for user {}", user_id)))?;

        self.artifacts.put(&key, artifact).map_err(|e| {
            error!(
                user_id,
                key = %key,
                backend = self.backend_name(),
                "Failed to write model artifact: {}",
                e
            );
            into_storage(e)
        })?;

        self.db
            .upsert_prediction_model(user_id, &key, sample_count, Utc::now())
            .map_err(|e| {
                error!(user_id, key = %key, "Failed to write model metadata: {}", e);
                into_storage(e)
            })?;

        let metadata = self
            .db
            .get_prediction_model(user_id)
            .map_err(into_storage)?
            .ok_or_else(|| {
                Error::Storage(format!("Model metadata for user {} vanished", user_id))
            })?;

        info!(user_id, key = %key, samples = sample_count, "Saved prediction model");
        Ok(metadata)
    }

    /// Load the user's live model
    ///
    /// Users without a metadata row are refused before any lock is taken,
    /// so the lock registry only holds users that trained at some point.
    pub fn load(&self, user_id: i64) -> Result<LoadedModel> {
        if self.metadata(user_id).map_err(into_storage)?.is_none() {
            return Err(Error::ModelNotTrained { user_id });
        }

        let lock = self.user_lock(user_id)?;
        let _guard = lock
            .read()
            .map_err(|_| Error::Storage(format!("Model lock poisoned for user {}", user_id)))?;

        // Re-read under the lock; a concurrent remove may have won
        let metadata = self
            .db
            .get_prediction_model(user_id)
            .map_err(into_storage)?
            .ok_or(Error::ModelNotTrained { user_id })?;

        let artifact = self
            .artifacts
            .get(&metadata.storage_key)
            .map_err(into_storage)?
            .ok_or_else(|| {
                error!(
                    user_id,
                    key = %metadata.storage_key,
                    "Model metadata present but artifact missing"
                );
                Error::Storage(format!(
                    "Artifact {} missing from {} store",
                    metadata.storage_key,
                    self.backend_name()
                ))
            })?;

        debug!(user_id, key = %metadata.storage_key, "Loaded prediction model");
        Ok(LoadedModel { artifact, metadata })
    }

    /// Drop the user's model; returns whether one was trained
    ///
    /// Metadata goes first so a failed artifact delete leaves the user
    /// untrained rather than pointing at a stale blob.
    pub fn remove(&self, user_id: i64) -> Result<bool> {
        let key = storage_key(user_id);
        let lock = self.user_lock(user_id)?;
        let removed = {
            let _guard = lock.write().map_err(|_| {
                Error::Storage(format!("Model lock poisoned for user {}", user_id))
            })?;

            let had_metadata = self
                .db
                .delete_prediction_model(user_id)
                .map_err(into_storage)?;
            let had_artifact = self.artifacts.delete(&key).map_err(|e| {
                error!(
                    user_id,
                    key = %key,
                    backend = self.backend_name(),
                    "Failed to delete model artifact: {}",
                    e
                );
                into_storage(e)
            })?;
            had_metadata || had_artifact
        };
        drop(lock);
        self.release_lock(user_id)?;

        info!(user_id, key = %key, removed, "Removed prediction model");
        Ok(removed)
    }

    /// Metadata row only, without touching the artifact backend
    pub fn metadata(&self, user_id: i64) -> Result<Option<PredictionModel>> {
        self.db.get_prediction_model(user_id)
    }
}

fn into_storage(err: Error) -> Error {
    match err {
        Error::Storage(_) => err,
        other => Error::Storage(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    impl ModelArtifactStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }

        fn get(&self, _key: &str) -> Result<Option<ModelArtifact>> {
            Ok(None)
        }

        fn put(&self, _key: &str, _artifact: &ModelArtifact) -> Result<()> {
            Err(Error::Io(std::io::Error::other("disk full")))
        }

        fn delete(&self, _key: &str) -> Result<bool> {
            Ok(false)
        }
    }

    fn artifact(slope: f64) -> ModelArtifact {
        ModelArtifact {
            slope,
            intercept: 1_000.0,
            mean: 2_000.0,
            std: 500.0,
        }
    }

    fn setup() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        let user_id = db.upsert_user("alice").unwrap();
        (db, user_id)
    }

    #[test]
    fn test_storage_key_format() {
        assert_eq!(storage_key(42), "expense_model_42");
    }

    #[test]
    fn test_load_untrained() {
        let (db, user_id) = setup();
        let store = ModelStore::new(db, Box::new(MemoryArtifactStore::new()));

        assert!(matches!(
            store.load(user_id),
            Err(Error::ModelNotTrained { user_id: id }) if id == user_id
        ));
    }

    #[test]
    fn test_save_then_load() {
        let (db, user_id) = setup();
        let store = ModelStore::new(db.clone(), Box::new(DatabaseArtifactStore::new(db)));

        let metadata = store.save(user_id, &artifact(2.0), 3).unwrap();
        assert_eq!(metadata.storage_key, format!("expense_model_{}", user_id));
        assert_eq!(metadata.sample_count, 3);

        let loaded = store.load(user_id).unwrap();
        assert_eq!(loaded.artifact, artifact(2.0));
        assert_eq!(loaded.metadata.user_id, user_id);
    }

    #[test]
    fn test_retrain_overwrites_in_place() {
        let (db, user_id) = setup();
        let store = ModelStore::new(db.clone(), Box::new(MemoryArtifactStore::new()));

        let first = store.save(user_id, &artifact(1.0), 3).unwrap();
        let second = store.save(user_id, &artifact(5.0), 4).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.sample_count, 4);
        assert_eq!(store.load(user_id).unwrap().artifact.slope, 5.0);
    }

    #[test]
    fn test_failed_put_leaves_untrained() {
        let (db, user_id) = setup();
        let store = ModelStore::new(db.clone(), Box::new(FailingStore));

        assert!(matches!(
            store.save(user_id, &artifact(1.0), 3),
            Err(Error::Storage(_))
        ));
        assert!(db.get_prediction_model(user_id).unwrap().is_none());
        assert!(matches!(
            store.load(user_id),
            Err(Error::ModelNotTrained { .. })
        ));
    }

    #[test]
    fn test_remove_model() {
        let (db, user_id) = setup();
        let artifacts = DatabaseArtifactStore::new(db.clone());
        let store = ModelStore::new(db.clone(), Box::new(artifacts));

        store.save(user_id, &artifact(2.0), 3).unwrap();
        assert!(store.remove(user_id).unwrap());
        assert!(!store.remove(user_id).unwrap());

        assert!(db.get_prediction_model(user_id).unwrap().is_none());
        assert!(matches!(
            store.load(user_id),
            Err(Error::ModelNotTrained { .. })
        ));
    }

    #[test]
    fn test_missing_artifact_is_storage_error() {
        let (db, user_id) = setup();
        db.upsert_prediction_model(user_id, &storage_key(user_id), 3, Utc::now())
            .unwrap();
        let store = ModelStore::new(db, Box::new(MemoryArtifactStore::new()));

        assert!(matches!(store.load(user_id), Err(Error::Storage(_))));
    }

    #[test]
    fn test_from_config_local_backend() {
        let (db, _) = setup();
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            backend: StoreBackend::Local,
            dir: Some(dir.path().join("models")),
        };

        let store = ModelStore::from_config(db, &config).unwrap();
        assert_eq!(store.backend_name(), "local");
        assert!(dir.path().join("models").is_dir());
    }

    #[test]
    fn test_users_are_independent() {
        let (db, alice) = setup();
        let bob = db.upsert_user("bob").unwrap();
        let store = ModelStore::new(db, Box::new(MemoryArtifactStore::new()));

        store.save(alice, &artifact(1.0), 3).unwrap();
        store.save(bob, &artifact(9.0), 5).unwrap();

        assert_eq!(store.load(alice).unwrap().artifact.slope, 1.0);
        assert_eq!(store.load(bob).unwrap().artifact.slope, 9.0);
    }

    #[test]
    fn test_untrained_loads_do_not_grow_lock_registry() {
        let (db, _) = setup();
        let store = ModelStore::new(db, Box::new(MemoryArtifactStore::new()));

        for user_id in 1_000..6_000 {
            assert!(matches!(
                store.load(user_id),
                Err(Error::ModelNotTrained { .. })
            ));
        }
        assert!(store.locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remove_releases_lock_entry() {
        let (db, user_id) = setup();
        let store = ModelStore::new(db, Box::new(MemoryArtifactStore::new()));

        store.save(user_id, &artifact(1.0), 3).unwrap();
        store.load(user_id).unwrap();
        assert_eq!(store.locks.lock().unwrap().len(), 1);

        store.remove(user_id).unwrap();
        assert!(store.locks.lock().unwrap().is_empty());

        // Removing a user that never trained leaves nothing behind either
        store.remove(user_id + 1).unwrap();
        assert!(store.locks.lock().unwrap().is_empty());
    }

    /// Artifact whose fields all derive from `n`, so a torn write is detectable
    fn consistent_artifact(n: u32) -> ModelArtifact {
        let n = f64::from(n);
        ModelArtifact {
            slope: n,
            intercept: n * 10.0,
            mean: n * 100.0,
            std: n + 1.0,
        }
    }

    #[test]
    fn test_concurrent_retrain_and_load_see_whole_artifacts() {
        let (db, user_id) = setup();
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ModelStore::new(
            db,
            Box::new(LocalArtifactStore::new(dir.path()).unwrap()),
        ));
        store.save(user_id, &consistent_artifact(0), 3).unwrap();

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for n in 1..=300 {
                    store.save(user_id, &consistent_artifact(n), 3).unwrap();
                }
            })
        };

        let reader = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..300 {
                    let a = store.load(user_id).unwrap().artifact;
                    assert_eq!(a.intercept, a.slope * 10.0);
                    assert_eq!(a.mean, a.slope * 100.0);
                    assert_eq!(a.std, a.slope + 1.0);
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();

        assert_eq!(
            store.load(user_id).unwrap().artifact,
            consistent_artifact(300)
        );
    }
}
