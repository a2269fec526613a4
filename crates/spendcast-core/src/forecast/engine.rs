//! Forecaster - train, predict and list insights for a user

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::aggregate::MonthlyAggregates;
use super::insights::{InsightGenerator, InsightRefresh, PredictionInsights};
use super::regression::ModelArtifact;
use super::store::ModelStore;
use crate::config::ForecastConfig;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{CategoryInsight, LedgerEntry, PredictionModel};

pub const NOT_ENOUGH_DATA_MESSAGE: &str =
    "Not enough data to train the model. Need at least 3 months of data with 10+ expenses.";
pub const TRAINING_FAILED_MESSAGE: &str =
    "Failed to train the model. Need at least 3 months of data.";
pub const TRAINED_MESSAGE: &str = "Model trained successfully";
pub const INCOME_REQUIRED_MESSAGE: &str = "Income is required";
pub const INVALID_INCOME_MESSAGE: &str = "Income must be a non-negative number";
pub const INCOME_OUT_OF_RANGE_MESSAGE: &str = "Income is too large to predict expenses for";
pub const MODEL_NOT_TRAINED_MESSAGE: &str =
    "Model not trained yet. Please train the model first.";

/// Result of a successful training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainSummary {
    pub user_id: i64,
    pub expense_records: usize,
    pub income_records: usize,
    /// Monthly (income, expense) pairs the model was fitted on
    pub samples: usize,
    pub artifact: ModelArtifact,
    pub model: PredictionModel,
    /// Bracket and row count written by the insight refresh, if any
    #[serde(skip)]
    pub insights: Option<InsightRefresh>,
}

impl TrainSummary {
    pub fn message(&self) -> &'static str {
        TRAINED_MESSAGE
    }
}

/// Predicted expense for a hypothetical income
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_expense: f64,
    pub income: f64,
    /// `income - predicted_expense`, may be negative
    pub savings_potential: f64,
    pub insights_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<PredictionInsights>,
}

/// Why a prediction request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    ValidationError,
    ModelNotTrained,
}

impl FailureReason {
    /// Classify a caller-facing failure; `None` for internal errors
    pub fn of(err: &Error) -> Option<Self> {
        match err {
            Error::Validation(_) => Some(Self::ValidationError),
            Error::ModelNotTrained { .. } => Some(Self::ModelNotTrained),
            _ => None,
        }
    }

    /// Message shown to the caller for this failure
    pub fn message(&self, err: &Error) -> String {
        match (self, err) {
            (Self::ValidationError, Error::Validation(msg)) => msg.clone(),
            (Self::ValidationError, _) => INVALID_INCOME_MESSAGE.to_string(),
            (Self::ModelNotTrained, _) => MODEL_NOT_TRAINED_MESSAGE.to_string(),
        }
    }
}

/// Message for a training refusal (`Validation` or `InsufficientData`)
pub fn training_failure_message(err: &Error) -> Option<&str> {
    match err {
        Error::Validation(msg) | Error::InsufficientData(msg) => Some(msg.as_str()),
        _ => None,
    }
}

/// Entry point for the expense prediction engine
///
/// Built once per process and shared; holds no per-request state besides
/// the model store's per-user locks.
pub struct Forecaster {
    db: Database,
    store: ModelStore,
    insights: InsightGenerator,
    config: ForecastConfig,
}

impl Forecaster {
    /// Build a forecaster with the artifact backend selected in config
    pub fn new(db: Database, config: ForecastConfig) -> Result<Self> {
        let store = ModelStore::from_config(db.clone(), &config.store)?;
        Ok(Self::with_store(db, config, store))
    }

    /// Build a forecaster around an existing model store
    pub fn with_store(db: Database, config: ForecastConfig, store: ModelStore) -> Self {
        let insights = InsightGenerator::new(db.clone(), config.insights.clone());
        Self {
            db,
            store,
            insights,
            config,
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Train on the user's ledger window ending today
    pub fn train(&self, user_id: i64) -> Result<TrainSummary> {
        self.train_as_of(user_id, Utc::now().date_naive())
    }

    /// Train on the `window_days` of ledger history ending at `today`
    pub fn train_as_of(&self, user_id: i64, today: NaiveDate) -> Result<TrainSummary> {
        let since = today - Duration::days(i64::from(self.config.training.window_days));
        let entries: Vec<LedgerEntry> = self
            .db
            .list_ledger_entries(user_id, since)?
            .into_iter()
            .filter(|e| e.date <= today)
            .collect();

        debug!(user_id, %since, %today, entries = entries.len(), "Loaded training window");
        self.train_on_entries(user_id, &entries)
    }

    /// Validate, fit and persist a model from an explicit record set, then
    /// refresh the user's category insights from the same records
    ///
    /// Nothing is written unless validation and fitting both succeed.
    pub fn train_on_entries(
        &self,
        user_id: i64,
        entries: &[LedgerEntry],
    ) -> Result<TrainSummary> {
        let training = &self.config.training;

        let (expenses, incomes): (Vec<LedgerEntry>, Vec<LedgerEntry>) =
            entries.iter().cloned().partition(LedgerEntry::is_expense);

        if expenses.len() < training.min_expenses || incomes.len() < training.min_incomes {
            warn!(
                user_id,
                expenses = expenses.len(),
                incomes = incomes.len(),
                "Not enough ledger records to train"
            );
            return Err(Error::Validation(NOT_ENOUGH_DATA_MESSAGE.to_string()));
        }

        let samples = MonthlyAggregates::from_entries(entries).training_samples();
        if samples.len() < training.min_samples {
            warn!(user_id, samples = samples.len(), "Too few monthly samples to train");
            return Err(Error::InsufficientData(TRAINING_FAILED_MESSAGE.to_string()));
        }

        let artifact = ModelArtifact::fit(&samples)?;
        let model = self.store.save(user_id, &artifact, samples.len())?;

        // The model is live from here on; an insight failure must not hide that
        let total_income: f64 = incomes.iter().map(|e| e.amount).sum();
        let insights = match self.insights.refresh(user_id, &expenses, total_income) {
            Ok(refresh) => refresh,
            Err(e) => {
                error!(user_id, "Model saved but insight refresh failed: {}", e);
                None
            }
        };

        info!(
            user_id,
            samples = samples.len(),
            slope = artifact.slope,
            intercept = artifact.intercept,
            "Trained expense model"
        );

        Ok(TrainSummary {
            user_id,
            expense_records: expenses.len(),
            income_records: incomes.len(),
            samples: samples.len(),
            artifact,
            model,
            insights,
        })
    }

    /// Predict total expense for `income` with the user's live model
    pub fn predict(&self, user_id: i64, income: f64) -> Result<Prediction> {
        if !income.is_finite() || income < 0.0 {
            return Err(Error::Validation(INVALID_INCOME_MESSAGE.to_string()));
        }

        let loaded = self.store.load(user_id)?;
        let predicted_expense = loaded.artifact.predict(income);
        let savings_potential = income - predicted_expense;
        if !predicted_expense.is_finite() || !savings_potential.is_finite() {
            warn!(user_id, income, "Prediction overflowed");
            return Err(Error::Validation(INCOME_OUT_OF_RANGE_MESSAGE.to_string()));
        }

        let insights = self.insights.lookup(user_id, income, predicted_expense)?;

        debug!(
            user_id,
            income,
            predicted_expense,
            insights = insights.is_some(),
            "Predicted expenses"
        );

        Ok(Prediction {
            predicted_expense,
            income,
            savings_potential,
            insights_available: insights.is_some(),
            insights,
        })
    }

    /// All category insights stored for the user
    pub fn list_insights(&self, user_id: i64) -> Result<Vec<CategoryInsight>> {
        self.insights.list(user_id)
    }

    /// Metadata of the user's live model, `None` if never trained
    pub fn model_status(&self, user_id: i64) -> Result<Option<PredictionModel>> {
        self.store.metadata(user_id)
    }

    /// Forget the user's model; stored insights are kept
    pub fn reset_model(&self, user_id: i64) -> Result<bool> {
        self.store.remove(user_id)
    }
}
