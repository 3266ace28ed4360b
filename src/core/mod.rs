//! Core business logic module
//!
//! This module provides the core application layer including:
//! - The lending workflow (issue/return with debt enforcement)
//! - The external catalog import
//! - Configuration management
//! - Structured logging system
//! - Error handling and type system

pub mod config;
pub mod error;
pub mod import;
pub mod lending;
pub mod logging;

pub use config::Config;
pub use error::{ErrorContext, ErrorResponse, LibraryError, Result};
pub use import::{CatalogSource, FrappeCatalog, ImportFilters, ImportService};
pub use lending::{LendingService, ReturnOutcome, DEBT_CEILING};
pub use logging::Logger;
