//! Ledger operations (dated income and expense entries)

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::{Error, Result};
use crate::models::{LedgerEntry, NewLedgerEntry, TransactionKind};

impl Database {
    /// Insert a ledger entry for a user
    ///
    /// Returns `None` when an entry with the same import hash already exists.
    /// The entry's category is registered if it is not yet known.
    pub fn insert_ledger_entry(&self, user_id: i64, entry: &NewLedgerEntry) -> Result<Option<i64>> {
        if !entry.amount.is_finite() || entry.amount < 0.0 {
            return Err(Error::InvalidData(format!(
                "Amount must be a non-negative number, got {}",
                entry.amount
            )));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        if let Some(hash) = &entry.import_hash {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM transactions WHERE import_hash = ?",
                    params![hash],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Ok(None);
            }
        }

        let category_id = match entry.category.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(Self::upsert_category_with_conn(&tx, name)?),
            _ => None,
        };

        tx.execute(
            r#"
            INSERT INTO transactions (user_id, kind, amount, category_id, description, date, import_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                entry.kind.as_str(),
                entry.amount,
                category_id,
                entry.description,
                entry.date.to_string(),
                entry.import_hash,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Some(id))
    }

    /// List a user's ledger entries dated on or after `since`, oldest first
    pub fn list_ledger_entries(&self, user_id: i64, since: NaiveDate) -> Result<Vec<LedgerEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.id, t.user_id, t.kind, t.amount, t.category_id, c.name, t.description, t.date
            FROM transactions t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE t.user_id = ? AND t.date >= ?
            ORDER BY t.date, t.id
            "#,
        )?;

        let entries = stmt
            .query_map(params![user_id, since.to_string()], |row| {
                let kind_str: String = row.get(2)?;
                let date_str: String = row.get(7)?;
                let kind = kind_str.parse::<TransactionKind>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        rusqlite::types::Type::Text,
                        e.into(),
                    )
                })?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        7,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;

                Ok(LedgerEntry {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    kind,
                    amount: row.get(3)?,
                    category_id: row.get(4)?,
                    category: row.get(5)?,
                    description: row.get(6)?,
                    date,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Count a user's ledger entries by kind (all dates)
    pub fn count_ledger_entries(&self, user_id: i64, kind: TransactionKind) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ? AND kind = ?",
            params![user_id, kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
