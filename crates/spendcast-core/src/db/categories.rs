//! Category registry operations

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::Category;

impl Database {
    /// Register a category by name, returning its ID (existing or new)
    pub fn upsert_category(&self, name: &str) -> Result<i64> {
        let conn = self.conn()?;
        Self::upsert_category_with_conn(&conn, name)
    }

    pub(crate) fn upsert_category_with_conn(
        conn: &rusqlite::Connection,
        name: &str,
    ) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Category name cannot be empty".into()));
        }

        conn.execute(
            "INSERT INTO categories (name) VALUES (?) ON CONFLICT(name) DO NOTHING",
            params![name],
        )?;
        let id: i64 = conn.query_row(
            "SELECT id FROM categories WHERE name = ?",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// List all categories alphabetically
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, created_at FROM categories ORDER BY name")?;
        let categories = stmt
            .query_map([], |row| {
                let created_at: String = row.get(2)?;
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: parse_datetime(&created_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Delete a category; ledger entries keep their rows with no category
    pub fn delete_category(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM categories WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_registry() {
        let db = Database::in_memory().unwrap();

        let food = db.upsert_category("Food").unwrap();
        assert_eq!(db.upsert_category("Food").unwrap(), food);
        let rent = db.upsert_category("Rent").unwrap();

        assert_ne!(food, rent);

        let categories: Vec<_> = db
            .list_categories()
            .unwrap()
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        assert_eq!(
            categories,
            vec![(food, "Food".to_string()), (rent, "Rent".to_string())]
        );
    }

    #[test]
    fn test_delete_category() {
        let db = Database::in_memory().unwrap();
        let id = db.upsert_category("Travel").unwrap();
        assert!(db.delete_category(id).unwrap());
        assert!(!db.delete_category(id).unwrap());
        assert!(db.list_categories().unwrap().is_empty());
    }
}
