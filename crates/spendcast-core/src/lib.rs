//! Spendcast Core Library
//!
//! Shared functionality for the Spendcast expense prediction engine:
//! - Database access and migrations (ledger, model metadata, insights)
//! - Ledger CSV import
//! - Forecast engine: monthly aggregation, scaled single-feature regression,
//!   per-user model store, and income-bracketed category insights
//! - TOML configuration with embedded defaults

pub mod config;
pub mod db;
pub mod error;
pub mod forecast;
pub mod import;
pub mod models;

pub use config::{ForecastConfig, InsightConfig, StoreBackend, StoreConfig, TrainingConfig};
pub use db::Database;
pub use error::{Error, Result};
pub use forecast::{
    FailureReason, Forecaster, IncomeBracket, ModelArtifact, ModelStore, Prediction,
    PredictionInsights, TrainSummary,
};
pub use import::{import_ledger, parse_ledger_csv, ImportStats};
