//! Domain models for Spendcast

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::forecast::IncomeBracket;

/// A ledger owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// An expense category from the category registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Whether a ledger entry is money going out or coming in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" | "expenses" => Ok(Self::Expense),
            "income" | "incomes" => Ok(Self::Income),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A dated income or expense record read from the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: i64,
    pub kind: TransactionKind,
    /// Non-negative amount
    pub amount: f64,
    pub category_id: Option<i64>,
    /// Display name resolved through the category registry (expenses only)
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: NaiveDate,
}

impl LedgerEntry {
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}

/// A ledger entry to be inserted
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub kind: TransactionKind,
    pub amount: f64,
    /// Category name; registered on insert if unknown
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: NaiveDate,
    /// Deduplication key for imported rows
    pub import_hash: Option<String>,
}

#[cfg(test)]
impl NewLedgerEntry {
    pub fn expense(amount: f64, category: &str, date: NaiveDate) -> Self {
        Self {
            kind: TransactionKind::Expense,
            amount,
            category: Some(category.to_string()),
            description: None,
            date,
            import_hash: None,
        }
    }

    pub fn income(amount: f64, date: NaiveDate) -> Self {
        Self {
            kind: TransactionKind::Income,
            amount,
            category: None,
            description: None,
            date,
            import_hash: None,
        }
    }
}

/// Metadata row for a user's live prediction model
///
/// The coefficients themselves live in the artifact store under `storage_key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionModel {
    pub id: i64,
    pub user_id: i64,
    pub storage_key: String,
    /// Number of monthly (income, expense) pairs the model was fitted on
    pub sample_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_trained: DateTime<Utc>,
}

/// Fraction of income historically spent on one category within an income bracket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInsight {
    pub id: i64,
    pub user_id: i64,
    pub income_bracket: IncomeBracket,
    pub category: String,
    pub avg_percentage: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
