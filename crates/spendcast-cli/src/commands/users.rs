//! User registry commands

use anyhow::Result;
use spendcast_core::db::Database;

pub fn cmd_users_list(db: &Database) -> Result<()> {
    let users = db.list_users()?;

    if users.is_empty() {
        println!("No users yet. Add one with: spendcast users add <name>");
        return Ok(());
    }

    println!("👤 Users");
    println!("   ─────────────────────────────");
    for user in users {
        println!(
            "   {:>4}  {:<24} since {}",
            user.id,
            user.name,
            user.created_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}

pub fn cmd_users_add(db: &Database, name: &str) -> Result<()> {
    let id = db.upsert_user(name)?;
    println!("✅ User '{}' has ID {}", name.trim(), id);
    Ok(())
}
