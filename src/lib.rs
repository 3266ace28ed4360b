//! Libretto Backend Library
//!
//! This library provides the core functionality for the Libretto library
//! management backend: book catalog, member registry, loan ledger, and the
//! external catalog import, exposed over a REST API.

pub mod api;
pub mod core;
pub mod db;

// Re-export commonly used types
pub use api::ApiServer;
pub use crate::core::{Config, ImportService, LendingService};
pub use db::DatabaseManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type alias for the library
pub type Result<T> = anyhow::Result<T>;
