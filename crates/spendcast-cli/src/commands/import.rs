//! Ledger import command

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use spendcast_core::{db::Database, import::import_ledger};

pub fn cmd_import(db: &Database, user_id: i64, file: &Path) -> Result<()> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;

    println!("📥 Importing ledger from {}...", file.display());

    let stats = import_ledger(db, user_id, csv_file)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    println!("   Found {} entries", stats.total);
    println!("✅ Imported {} entries", stats.imported);
    if stats.skipped > 0 {
        println!("   Skipped {} already-imported entries", stats.skipped);
    }

    Ok(())
}
