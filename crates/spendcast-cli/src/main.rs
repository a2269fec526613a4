//! Spendcast CLI - Personal expense prediction
//!
//! Usage:
//!   spendcast init                                Initialize database
//!   spendcast users add alice                     Register a ledger owner
//!   spendcast import --user 1 --file ledger.csv   Import ledger entries
//!   spendcast train --user 1                      Train the expense model
//!   spendcast predict --user 1 --income 2500000   Predict expenses
//!   spendcast serve --port 3000                   Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Users { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(UsersAction::List) => commands::cmd_users_list(&db),
                Some(UsersAction::Add { name }) => commands::cmd_users_add(&db, &name),
            }
        }
        Commands::Categories { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(CategoriesAction::List) => commands::cmd_categories_list(&db),
                Some(CategoriesAction::Add { name }) => commands::cmd_categories_add(&db, &name),
                Some(CategoriesAction::Delete { id }) => {
                    commands::cmd_categories_delete(&db, id)
                }
            }
        }
        Commands::Import { user, file } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, user, &file)
        }
        Commands::Train { user, as_of } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let forecaster = commands::open_forecaster(&db, config_path)?;
            commands::cmd_train(&forecaster, user, as_of)
        }
        Commands::Predict { user, income, json } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let forecaster = commands::open_forecaster(&db, config_path)?;
            commands::cmd_predict(&forecaster, user, income, json)
        }
        Commands::Insights { user, json } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let forecaster = commands::open_forecaster(&db, config_path)?;
            commands::cmd_insights(&forecaster, user, json)
        }
        Commands::Model { user, reset } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let forecaster = commands::open_forecaster(&db, config_path)?;
            if reset {
                commands::cmd_model_reset(&forecaster, user)
            } else {
                commands::cmd_model(&forecaster, user)
            }
        }
        Commands::Serve {
            port,
            host,
            allowed_origins,
        } => {
            commands::cmd_serve(
                &cli.db,
                &host,
                port,
                cli.no_encrypt,
                config_path,
                allowed_origins,
            )
            .await
        }
    }
}
