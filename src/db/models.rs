//! Database models
//!
//! Data structures representing database tables, with row mappers shared by
//! the repositories and the lending workflow.

use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Loan status: created `issued`, transitions once to `returned`.
pub const STATUS_ISSUED: &str = "issued";
pub const STATUS_RETURNED: &str = "returned";

/// Column list matching [`Book::from_row`]
pub const BOOK_COLUMNS: &str = "id, external_id, title, authors, isbn, isbn13, publisher, \
     num_pages, average_rating, language_code, publication_date, ratings_count, \
     stock, rent_per_day, created_at, updated_at";

/// Book record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    /// Identifier assigned by the external catalog; unique when present
    pub external_id: Option<String>,
    pub title: String,
    /// One `/`-delimited string, normalized from string-or-sequence input
    pub authors: String,
    pub isbn: String,
    pub isbn13: String,
    pub publisher: String,
    pub num_pages: i64,
    // Opaque display strings from the external catalog
    pub average_rating: String,
    pub language_code: String,
    pub publication_date: String,
    pub ratings_count: String,
    pub stock: i64,
    pub rent_per_day: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl Book {
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Book {
            id: row.get(0)?,
            external_id: row.get(1)?,
            title: row.get(2)?,
            authors: row.get(3)?,
            isbn: row.get(4)?,
            isbn13: row.get(5)?,
            publisher: row.get(6)?,
            num_pages: row.get(7)?,
            average_rating: row.get(8)?,
            language_code: row.get(9)?,
            publication_date: row.get(10)?,
            ratings_count: row.get(11)?,
            stock: row.get(12)?,
            rent_per_day: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }
}

/// Column list matching [`Member::from_row`]
pub const MEMBER_COLUMNS: &str =
    "id, name, email, phone, outstanding_debt, created_at, updated_at";

/// Member record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    /// Lowercased on write; unique
    pub email: String,
    pub phone: String,
    pub outstanding_debt: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl Member {
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Member {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            outstanding_debt: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

/// Column list matching [`LoanTransaction::from_row`]
pub const TRANSACTION_COLUMNS: &str = "id, book_id, member_id, issue_date, return_date, \
     rent_fee, status, created_at, updated_at";

/// Loan ledger record linking one book and one member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTransaction {
    pub id: String,
    pub book_id: String,
    pub member_id: String,
    pub issue_date: String,
    pub return_date: Option<String>,
    /// Computed at return time; zero while the loan is open
    pub rent_fee: f64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl LoanTransaction {
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(LoanTransaction {
            id: row.get(0)?,
            book_id: row.get(1)?,
            member_id: row.get(2)?,
            issue_date: row.get(3)?,
            return_date: row.get(4)?,
            rent_fee: row.get(5)?,
            status: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

/// Ledger projection with the linked book and member fields denormalized
/// for display.
#[derive(Debug, Clone, Serialize)]
pub struct LoanRecord {
    pub transaction: LoanTransaction,
    pub book_title: String,
    pub book_authors: String,
    pub member_name: String,
    pub member_email: String,
}
