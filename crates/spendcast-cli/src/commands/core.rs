//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `open_forecaster` - Build the forecast engine from config
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use spendcast_core::{db::Database, ForecastConfig, Forecaster};
use tracing::debug;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    debug!(path = path_str, encrypted = !no_encrypt, "Opening database");
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Load forecast config (see `ForecastConfig::load` for resolution order)
pub fn load_config(config_path: Option<&Path>) -> Result<ForecastConfig> {
    ForecastConfig::load(config_path).context("Failed to load forecast config")
}

pub fn open_forecaster(db: &Database, config_path: Option<&Path>) -> Result<Forecaster> {
    let config = load_config(config_path)?;
    Forecaster::new(db.clone(), config).context("Failed to initialize model store")
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;

    if db.is_encrypted()? {
        println!("   🔒 Encryption: ENABLED");
    } else {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    }
    println!("   Path: {}", db.path());

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add a user: spendcast users add <name>");
    println!("  2. Import ledger: spendcast import --user 1 --file ledger.csv");
    println!("  3. Train: spendcast train --user 1");

    Ok(())
}
