//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (open_db, open_forecaster) and init
//! - `users` - User registry commands
//! - `categories` - Category registry commands
//! - `import` - Ledger CSV import
//! - `forecast` - Train, predict, insights, model status
//! - `serve` - Web server command

pub mod categories;
pub mod core;
pub mod forecast;
pub mod import;
pub mod serve;
pub mod users;

// Re-export command functions for main.rs
pub use categories::*;
pub use core::*;
pub use forecast::*;
pub use import::*;
pub use serve::*;
pub use users::*;
