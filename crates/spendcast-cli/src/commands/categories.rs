//! Category registry commands

use anyhow::{bail, Result};
use spendcast_core::db::Database;

pub fn cmd_categories_list(db: &Database) -> Result<()> {
    let categories = db.list_categories()?;

    if categories.is_empty() {
        println!(
            "No categories yet. They are created on import, or with: spendcast categories add <name>"
        );
        return Ok(());
    }

    println!("🏷️  Categories");
    println!("   ─────────────────────────────");
    for category in categories {
        println!("   {:>4}  {}", category.id, category.name);
    }

    Ok(())
}

pub fn cmd_categories_add(db: &Database, name: &str) -> Result<()> {
    let id = db.upsert_category(name)?;
    println!("✅ Category '{}' has ID {}", name.trim(), id);
    Ok(())
}

pub fn cmd_categories_delete(db: &Database, id: i64) -> Result<()> {
    if !db.delete_category(id)? {
        bail!("Category {} not found", id);
    }
    println!("🗑️  Deleted category {}", id);
    Ok(())
}
