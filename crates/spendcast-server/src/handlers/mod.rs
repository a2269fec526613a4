//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod predictions;
pub mod users;

// Re-export all handlers for use in router
pub use predictions::*;
pub use users::*;
