//! Monthly aggregation of ledger entries into training samples

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{LedgerEntry, TransactionKind};

/// Calendar month bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One month's (income, total expense) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub month: MonthKey,
    pub income: f64,
    pub expense: f64,
}

/// Per-month totals for one user's ledger window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyAggregates {
    pub expenses: BTreeMap<MonthKey, f64>,
    pub incomes: BTreeMap<MonthKey, f64>,
}

impl MonthlyAggregates {
    /// Sum entries into monthly expense and income totals
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Self {
        let mut aggregates = Self::default();

        for entry in entries {
            let totals = match entry.kind {
                TransactionKind::Expense => &mut aggregates.expenses,
                TransactionKind::Income => &mut aggregates.incomes,
            };
            *totals.entry(MonthKey::of(entry.date)).or_insert(0.0) += entry.amount;
        }

        aggregates
    }

    /// Months present in both maps, in ascending month order
    pub fn training_samples(&self) -> Vec<TrainingSample> {
        self.expenses
            .iter()
            .filter_map(|(month, &expense)| {
                self.incomes.get(month).map(|&income| TrainingSample {
                    month: *month,
                    income,
                    expense,
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty() && self.incomes.is_empty()
    }
}
