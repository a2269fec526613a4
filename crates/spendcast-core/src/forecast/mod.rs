//! Predictive expense engine
//!
//! Turns a user's dated income and expense records into a per-user model of
//! monthly expense as a function of monthly income, and into category
//! spending insights bucketed by income bracket.
//!
//! ## Pipeline
//!
//! - **Aggregate** - ledger window to monthly totals and (income, expense) pairs
//! - **Fit** - standardise income, closed-form least squares on the pairs
//! - **Store** - one artifact + metadata row per user, replaced on retrain
//! - **Insights** - per-category share of window income, upserted per bracket
//!
//! ## Usage
//!
//! ```rust,ignore
//! use spendcast_core::{Database, ForecastConfig, Forecaster};
//!
//! let forecaster = Forecaster::new(db, ForecastConfig::default())?;
//! forecaster.train(user_id)?;
//! let prediction = forecaster.predict(user_id, 2_500_000.0)?;
//! ```

pub mod aggregate;
pub mod bracket;
pub mod engine;
pub mod insights;
pub mod regression;
pub mod store;

pub use aggregate::{MonthKey, MonthlyAggregates, TrainingSample};
pub use bracket::IncomeBracket;
pub use engine::{training_failure_message, FailureReason, Forecaster, Prediction, TrainSummary};
pub use insights::{InsightGenerator, InsightRefresh, PredictionInsights};
pub use regression::{FeatureScaler, LinearFit, ModelArtifact};
pub use store::{
    storage_key, DatabaseArtifactStore, LoadedModel, LocalArtifactStore, MemoryArtifactStore,
    ModelArtifactStore, ModelStore,
};
