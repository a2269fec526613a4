//! Category insights bucketed by income bracket
//!
//! After each successful training run the window's expenses are summed per
//! category and divided by the window's total income. The resulting
//! percentages are stored under the bracket that total falls in. At
//! prediction time the bracket of the requested income selects which rows
//! are shown, plus warnings and suggestions derived from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::bracket::IncomeBracket;
use crate::config::InsightConfig;
use crate::db::Database;
use crate::error::Result;
use crate::models::{CategoryInsight, LedgerEntry};

pub const HIGH_EXPENSE_WARNING: &str =
    "Your predicted expenses are very high relative to your income. Consider reducing spending.";

/// Insights attached to a successful prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInsights {
    pub income_bracket: IncomeBracket,
    pub category_insights: Vec<CategoryInsight>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Outcome of a refresh that wrote rows
#[derive(Debug, Clone, PartialEq)]
pub struct InsightRefresh {
    pub income_bracket: IncomeBracket,
    pub categories: usize,
}

pub struct InsightGenerator {
    db: Database,
    config: InsightConfig,
}

impl InsightGenerator {
    pub fn new(db: Database, config: InsightConfig) -> Self {
        Self { db, config }
    }

    /// Fraction of `total_income` spent per category, ordered by category name
    ///
    /// Expenses without a resolvable category are skipped. Returns an empty
    /// list when `total_income` is not positive.
    pub fn category_percentages(expenses: &[LedgerEntry], total_income: f64) -> Vec<(String, f64)> {
        if !total_income.is_finite() || total_income <= 0.0 {
            return Vec::new();
        }

        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for entry in expenses.iter().filter(|e| e.is_expense()) {
            match entry.category.as_deref() {
                Some(category) if !category.is_empty() => {
                    *totals.entry(category).or_default() += entry.amount;
                }
                _ => {}
            }
        }

        totals
            .into_iter()
            .map(|(category, total)| (category.to_string(), total / total_income))
            .collect()
    }

    /// Recompute and upsert the user's insights for the bracket of `total_income`
    ///
    /// No-op (returns `None`) when total income is zero or there are no
    /// categorised expenses.
    pub fn refresh(
        &self,
        user_id: i64,
        expenses: &[LedgerEntry],
        total_income: f64,
    ) -> Result<Option<InsightRefresh>> {
        let Some(bracket) = IncomeBracket::classify(total_income).filter(|_| total_income > 0.0)
        else {
            debug!(user_id, total_income, "Skipping insight refresh, no income in window");
            return Ok(None);
        };

        let percentages = Self::category_percentages(expenses, total_income);
        if percentages.is_empty() {
            debug!(user_id, "Skipping insight refresh, no categorised expenses");
            return Ok(None);
        }

        let categories = self
            .db
            .upsert_category_insights(user_id, bracket, &percentages)?;

        info!(user_id, bracket = %bracket, categories, "Refreshed category insights");
        Ok(Some(InsightRefresh {
            income_bracket: bracket,
            categories,
        }))
    }

    /// Insights for the bracket containing `income`, or `None` if that
    /// bracket has no rows for the user
    pub fn lookup(
        &self,
        user_id: i64,
        income: f64,
        predicted_expense: f64,
    ) -> Result<Option<PredictionInsights>> {
        let Some(bracket) = IncomeBracket::classify(income) else {
            return Ok(None);
        };

        let rows = self.db.list_category_insights_for_bracket(user_id, bracket)?;
        if rows.is_empty() {
            return Ok(None);
        }

        Ok(Some(self.compose(bracket, rows, income, predicted_expense)))
    }

    /// Attach warnings and suggestions to a bracket's rows
    pub fn compose(
        &self,
        bracket: IncomeBracket,
        rows: Vec<CategoryInsight>,
        income: f64,
        predicted_expense: f64,
    ) -> PredictionInsights {
        let mut warnings = Vec::new();
        if predicted_expense > income * self.config.warning_ratio {
            warnings.push(HIGH_EXPENSE_WARNING.to_string());
        }

        let suggestions = rows
            .iter()
            .filter(|row| row.avg_percentage > self.config.suggestion_threshold)
            .map(|row| {
                format!(
                    "Consider reducing spending on {} which typically takes {:.1}% of income.",
                    row.category,
                    row.avg_percentage * 100.0
                )
            })
            .collect();

        PredictionInsights {
            income_bracket: bracket,
            category_insights: rows,
            warnings,
            suggestions,
        }
    }

    /// Every stored insight for the user
    pub fn list(&self, user_id: i64) -> Result<Vec<CategoryInsight>> {
        self.db.list_category_insights(user_id)
    }
}
