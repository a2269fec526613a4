//! Error types for Spendcast

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    /// Caller-supplied input or the raw ledger window failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Too few monthly income/expense pairs to fit a model
    #[error("Insufficient training data: {0}")]
    InsufficientData(String),

    /// Prediction requested before any successful training run
    #[error("Model not trained for user {user_id}")]
    ModelNotTrained { user_id: i64 },

    /// Model artifact or metadata could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Storage(format!("Failed to persist artifact: {}", err.error))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
