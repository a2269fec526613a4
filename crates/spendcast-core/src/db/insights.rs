//! Category insight database operations

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::forecast::IncomeBracket;
use crate::models::CategoryInsight;

const INSIGHT_COLUMNS: &str =
    "id, user_id, income_bracket, category, avg_percentage, created_at, updated_at";

impl Database {
    /// Upsert category percentages for one (user, income bracket)
    ///
    /// Existing (user, bracket, category) rows get the new percentage; new keys
    /// are inserted. All rows are written in a single transaction.
    pub fn upsert_category_insights(
        &self,
        user_id: i64,
        bracket: IncomeBracket,
        percentages: &[(String, f64)],
    ) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO category_insights (user_id, income_bracket, category, avg_percentage)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(user_id, income_bracket, category) DO UPDATE SET
                    avg_percentage = excluded.avg_percentage,
                    updated_at = CURRENT_TIMESTAMP
                "#,
            )?;

            for (category, percentage) in percentages {
                stmt.execute(params![user_id, bracket.label(), category, percentage])?;
            }
        }

        tx.commit()?;
        Ok(percentages.len())
    }

    /// List all insights for a user, ordered by bracket then category
    pub fn list_category_insights(&self, user_id: i64) -> Result<Vec<CategoryInsight>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM category_insights WHERE user_id = ?",
            INSIGHT_COLUMNS
        ))?;
        let mut insights = stmt
            .query_map(params![user_id], Self::row_to_category_insight)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        insights.sort_by(|a, b| {
            a.income_bracket
                .cmp(&b.income_bracket)
                .then_with(|| a.category.cmp(&b.category))
        });
        Ok(insights)
    }

    /// List a user's insights within one income bracket, ordered by category
    pub fn list_category_insights_for_bracket(
        &self,
        user_id: i64,
        bracket: IncomeBracket,
    ) -> Result<Vec<CategoryInsight>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM category_insights WHERE user_id = ? AND income_bracket = ? ORDER BY category",
            INSIGHT_COLUMNS
        ))?;
        let insights = stmt
            .query_map(
                params![user_id, bracket.label()],
                Self::row_to_category_insight,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(insights)
    }

    fn row_to_category_insight(row: &rusqlite::Row) -> rusqlite::Result<CategoryInsight> {
        let bracket_str: String = row.get(2)?;
        let created_at: String = row.get(5)?;
        let updated_at: String = row.get(6)?;

        let income_bracket = bracket_str.parse::<IncomeBracket>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
        })?;

        Ok(CategoryInsight {
            id: row.get(0)?,
            user_id: row.get(1)?,
            income_bracket,
            category: row.get(3)?,
            avg_percentage: row.get(4)?,
            created_at: parse_datetime(&created_at),
            updated_at: parse_datetime(&updated_at),
        })
    }
}
