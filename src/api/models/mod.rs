pub mod books;
pub mod common;
pub mod import;
pub mod members;
pub mod transactions;

pub use books::*;
pub use common::*;
pub use import::*;
pub use members::*;
pub use transactions::*;
