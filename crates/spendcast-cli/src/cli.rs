//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Spendcast - Predict expenses from your income history
#[derive(Parser)]
#[command(name = "spendcast")]
#[command(about = "Personal expense prediction and spending insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "spendcast.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SPENDCAST_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Forecast config file (TOML)
    ///
    /// Falls back to SPENDCAST_CONFIG, then the data dir override,
    /// then built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Manage users (list, add)
    Users {
        #[command(subcommand)]
        action: Option<UsersAction>,
    },

    /// Manage expense categories (list, add, delete)
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Import ledger entries from CSV (date,kind,amount,category,description)
    Import {
        /// User ID that owns the entries
        #[arg(short, long)]
        user: i64,

        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Train the user's expense model on recent ledger history
    Train {
        /// User ID
        #[arg(short, long)]
        user: i64,

        /// End of the training window (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Predict total expenses for an income
    Predict {
        /// User ID
        #[arg(short, long)]
        user: i64,

        /// Income to predict expenses for
        #[arg(short, long)]
        income: f64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored category insights
    Insights {
        /// User ID
        #[arg(short, long)]
        user: i64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the user's model status
    Model {
        /// User ID
        #[arg(short, long)]
        user: i64,

        /// Delete the trained model (insights are kept)
        #[arg(long)]
        reset: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Allowed CORS origin (repeatable)
        #[arg(long = "allow-origin")]
        allowed_origins: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List users
    List,
    /// Add a user (no-op if the name exists)
    Add {
        /// Display name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories
    List,
    /// Register a category
    Add {
        /// Category name
        name: String,
    },
    /// Delete a category (entries keep their amounts, lose the category)
    Delete {
        /// Category ID
        id: i64,
    },
}
