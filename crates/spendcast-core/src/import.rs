//! Ledger CSV import
//!
//! Format: `date,kind,amount,category,description`
//!
//! - `date` is `YYYY-MM-DD`
//! - `kind` is `expense` or `income`
//! - `category` is required for expenses and optional for incomes
//! - `description` is optional
//!
//! Each row gets a SHA-256 import hash so re-importing the same file is a no-op.

use std::io::Read;

use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{NewLedgerEntry, TransactionKind};

/// Outcome of importing a ledger file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    /// Rows parsed from the file
    pub total: usize,
    /// Rows inserted
    pub imported: usize,
    /// Rows already present (same import hash)
    pub skipped: usize,
}

/// Parse a ledger CSV into entries for `user_id`
pub fn parse_ledger_csv<R: Read>(reader: R, user_id: i64) -> Result<Vec<NewLedgerEntry>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = index + 2;

        let field = |i: usize| record.get(i).map(str::trim).filter(|s| !s.is_empty());

        let missing = |name: &str| Error::Import(format!("Line {}: missing {}", line, name));
        let date_str = field(0).ok_or_else(|| missing("date"))?;
        let kind_str = field(1).ok_or_else(|| missing("kind"))?;
        let amount_str = field(2).ok_or_else(|| missing("amount"))?;

        let date = parse_date(date_str).map_err(|e| line_error(line, e))?;
        let kind = kind_str
            .parse::<TransactionKind>()
            .map_err(|e| Error::Import(format!("Line {}: {}", line, e)))?;
        let amount = parse_amount(amount_str).map_err(|e| line_error(line, e))?;
        let category = field(3).map(String::from);
        let description = field(4).map(String::from);

        if kind == TransactionKind::Expense && category.is_none() {
            return Err(Error::Import(format!(
                "Line {}: expense rows need a category",
                line
            )));
        }

        let import_hash = generate_hash(
            user_id,
            line,
            &date,
            kind,
            amount,
            category.as_deref(),
            description.as_deref(),
        );

        entries.push(NewLedgerEntry {
            kind,
            amount,
            category,
            description,
            date,
            import_hash: Some(import_hash),
        });
    }

    debug!(user_id, rows = entries.len(), "Parsed ledger CSV");
    Ok(entries)
}

/// Parse and insert a ledger CSV, skipping rows imported before
pub fn import_ledger<R: Read>(db: &Database, user_id: i64, reader: R) -> Result<ImportStats> {
    if db.get_user(user_id)?.is_none() {
        return Err(Error::NotFound(format!("User {}", user_id)));
    }

    let entries = parse_ledger_csv(reader, user_id)?;
    let mut stats = ImportStats {
        total: entries.len(),
        ..Default::default()
    };

    for entry in &entries {
        match db.insert_ledger_entry(user_id, entry)? {
            Some(_) => stats.imported += 1,
            None => stats.skipped += 1,
        }
    }

    info!(
        user_id,
        total = stats.total,
        imported = stats.imported,
        skipped = stats.skipped,
        "Imported ledger"
    );
    Ok(stats)
}

/// Hash identifying one imported row
///
/// The line number keeps identical rows within one file distinct.
fn generate_hash(
    user_id: i64,
    line: usize,
    date: &NaiveDate,
    kind: TransactionKind,
    amount: f64,
    category: Option<&str>,
    description: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.to_be_bytes());
    hasher.update((line as u64).to_be_bytes());
    hasher.update(date.to_string().as_bytes());
    hasher.update(kind.as_str().as_bytes());
    hasher.update(amount.to_be_bytes());
    hasher.update(category.unwrap_or_default().as_bytes());
    hasher.update([0u8]);
    hasher.update(description.unwrap_or_default().as_bytes());
    hex::encode(hasher.finalize())
}

fn line_error(line: usize, err: Error) -> Error {
    match err {
        Error::Import(msg) => Error::Import(format!("Line {}: {}", line, msg)),
        other => other,
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse a non-negative amount, ignoring currency symbols and thousands separators
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s.trim().replace(['$', ',', ' '], "");

    let amount = cleaned
        .parse::<f64>()
        .map_err(|_| Error::Import(format!("Unable to parse amount: {}", s)))?;

    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::Import(format!(
            "Amount must be a non-negative number: {}",
            s
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEDGER: &str = "date,kind,amount,category,description
2024-01-01,income,\"2,000,000\",,Salary
2024-01-03,expense,600000,Rent,January rent
2024-01-10,expense,45.50,Food,
2024-01-10,expense,45.50,Food,
";

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("0").unwrap(), 0.0);
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn test_parse_ledger_csv() {
        let entries = parse_ledger_csv(LEDGER.as_bytes(), 1).unwrap();
        assert_eq!(entries.len(), 4);

        assert_eq!(entries[0].kind, TransactionKind::Income);
        assert_eq!(entries[0].amount, 2_000_000.0);
        assert_eq!(entries[0].category, None);
        assert_eq!(entries[0].description.as_deref(), Some("Salary"));

        assert_eq!(entries[1].category.as_deref(), Some("Rent"));
        assert_eq!(entries[2].description, None);

        // Identical rows on different lines hash differently
        assert_ne!(entries[2].import_hash, entries[3].import_hash);
    }

    #[test]
    fn test_hash_depends_on_user() {
        let a = parse_ledger_csv(LEDGER.as_bytes(), 1).unwrap();
        let b = parse_ledger_csv(LEDGER.as_bytes(), 2).unwrap();
        assert_ne!(a[0].import_hash, b[0].import_hash);
    }

    #[test]
    fn test_expense_requires_category() {
        let csv = "date,kind,amount,category,description\n2024-01-03,expense,10,,\n";
        let err = parse_ledger_csv(csv.as_bytes(), 1).unwrap_err();
        assert!(err.to_string().contains("Line 2"));
    }

    #[test]
    fn test_bad_rows_report_line() {
        let csv = "date,kind,amount,category,description\n2024-01-03,expense,10,Food,\n01/04/2024,expense,10,Food,\n";
        let err = parse_ledger_csv(csv.as_bytes(), 1).unwrap_err();
        assert!(err.to_string().contains("Line 3"));

        let csv = "date,kind,amount,category,description\n2024-01-03,refund,10,Food,\n";
        assert!(parse_ledger_csv(csv.as_bytes(), 1).is_err());
    }

    #[test]
    fn test_import_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let user_id = db.upsert_user("alice").unwrap();

        let first = import_ledger(&db, user_id, LEDGER.as_bytes()).unwrap();
        assert_eq!(
            first,
            ImportStats {
                total: 4,
                imported: 4,
                skipped: 0
            }
        );

        let second = import_ledger(&db, user_id, LEDGER.as_bytes()).unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.skipped, 4);

        assert_eq!(
            db.count_ledger_entries(user_id, TransactionKind::Expense)
                .unwrap(),
            3
        );
    }

    #[test]
    fn test_import_unknown_user() {
        let db = Database::in_memory().unwrap();
        assert!(matches!(
            import_ledger(&db, 99, LEDGER.as_bytes()),
            Err(Error::NotFound(_))
        ));
    }
}
