pub mod books;
pub mod import;
pub mod members;
pub mod transactions;

pub use books::*;
pub use import::*;
pub use members::*;
pub use transactions::*;

use crate::core::import::ImportService;
use crate::core::lending::LendingService;
use crate::db::repository::{BookRepository, MemberRepository};
use std::sync::Arc;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub book_repo: Arc<BookRepository>,
    pub member_repo: Arc<MemberRepository>,
    pub lending_service: Arc<LendingService>,
    pub import_service: Arc<ImportService>,
}
