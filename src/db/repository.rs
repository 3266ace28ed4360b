//! Repository pattern implementation for data access layer
//!
//! This module provides the Repository pattern for abstracting database
//! operations over books, members, and the loan ledger.

use crate::core::error::{LibraryError, Result};
use crate::db::manager::DatabaseManager;
use crate::db::models::{
    Book, LoanRecord, LoanTransaction, Member, BOOK_COLUMNS, MEMBER_COLUMNS, TRANSACTION_COLUMNS,
};
use async_trait::async_trait;
use rusqlite::OptionalExtension;
use std::collections::HashSet;
use std::sync::Arc;

/// Generic repository trait for CRUD operations
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Find an entity by its ID
    async fn find_by_id(&self, id: &str) -> Result<Option<T>>;

    /// Find all entities
    async fn find_all(&self) -> Result<Vec<T>>;

    /// Create a new entity
    async fn create(&self, entity: &T) -> Result<()>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> Result<()>;

    /// Delete an entity by its ID
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Build a `?,?,...` placeholder list for an IN clause
fn repeat_vars(count: usize) -> String {
    let mut s = "?,".repeat(count);
    s.pop();
    s
}

/// Translate a UNIQUE-constraint failure into a Conflict, leaving every
/// other database error untouched.
fn map_unique_violation(err: rusqlite::Error, message: &str) -> LibraryError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            LibraryError::Conflict(message.to_string())
        }
        _ => LibraryError::DatabaseError(err),
    }
}

/// Repository for Book entities
pub struct BookRepository {
    db: Arc<DatabaseManager>,
}

impl BookRepository {
    /// Create a new BookRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find a book by its external catalog identifier
    pub async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Book>> {
        let external_id = external_id.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM books WHERE external_id = ?", BOOK_COLUMNS),
                    [&external_id],
                    Book::from_row,
                )
                .optional()
                .map_err(LibraryError::DatabaseError)
            })
            .await
    }

    /// Which of the given external ids already exist in the catalog.
    ///
    /// One batch query, used by the import loop once per fetched page.
    pub async fn existing_external_ids(&self, ids: Vec<String>) -> Result<HashSet<String>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        self.db
            .execute(move |conn| {
                let query = format!(
                    "SELECT external_id FROM books WHERE external_id IN ({})",
                    repeat_vars(ids.len())
                );
                let mut stmt = conn.prepare(&query).map_err(LibraryError::DatabaseError)?;

                let existing = stmt
                    .query_map(rusqlite::params_from_iter(ids.iter()), |row| row.get(0))
                    .map_err(LibraryError::DatabaseError)?
                    .collect::<std::result::Result<HashSet<String>, _>>()
                    .map_err(LibraryError::DatabaseError)?;

                Ok(existing)
            })
            .await
    }

    /// Find one page of books, newest first, with the total count
    pub async fn list_paginated(&self, page: u32, limit: u32) -> Result<(Vec<Book>, usize)> {
        self.db
            .execute(move |conn| {
                let total: usize = conn
                    .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
                    .map_err(LibraryError::DatabaseError)?;

                let offset = page.saturating_sub(1) * limit;
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM books ORDER BY created_at DESC LIMIT ? OFFSET ?",
                        BOOK_COLUMNS
                    ))
                    .map_err(LibraryError::DatabaseError)?;

                let books = stmt
                    .query_map(rusqlite::params![limit, offset], Book::from_row)
                    .map_err(LibraryError::DatabaseError)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(LibraryError::DatabaseError)?;

                Ok((books, total))
            })
            .await
    }

    /// Free-text search over title and authors, most relevant first.
    ///
    /// A title match outranks an authors-only match; ties break newest first.
    pub async fn search(&self, query: &str, page: u32, limit: u32) -> Result<(Vec<Book>, usize)> {
        let pattern = format!("%{}%", query);
        self.db
            .execute(move |conn| {
                let total: usize = conn
                    .query_row(
                        "SELECT COUNT(*) FROM books WHERE title LIKE ?1 OR authors LIKE ?1",
                        [&pattern],
                        |row| row.get(0),
                    )
                    .map_err(LibraryError::DatabaseError)?;

                let offset = page.saturating_sub(1) * limit;
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {}, ((title LIKE ?1) * 2 + (authors LIKE ?1)) AS relevance \
                         FROM books WHERE title LIKE ?1 OR authors LIKE ?1 \
                         ORDER BY relevance DESC, created_at DESC LIMIT ?2 OFFSET ?3",
                        BOOK_COLUMNS
                    ))
                    .map_err(LibraryError::DatabaseError)?;

                let books = stmt
                    .query_map(rusqlite::params![pattern, limit, offset], Book::from_row)
                    .map_err(LibraryError::DatabaseError)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(LibraryError::DatabaseError)?;

                Ok((books, total))
            })
            .await
    }
}

#[async_trait]
impl Repository<Book> for BookRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Book>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS),
                    [&id],
                    Book::from_row,
                )
                .optional()
                .map_err(LibraryError::DatabaseError)
            })
            .await
    }

    async fn find_all(&self) -> Result<Vec<Book>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM books ORDER BY created_at DESC",
                        BOOK_COLUMNS
                    ))
                    .map_err(LibraryError::DatabaseError)?;

                let books = stmt
                    .query_map([], Book::from_row)
                    .map_err(LibraryError::DatabaseError)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(LibraryError::DatabaseError)?;

                Ok(books)
            })
            .await
    }

    async fn create(&self, book: &Book) -> Result<()> {
        let book = book.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO books (id, external_id, title, authors, isbn, isbn13, \
                     publisher, num_pages, average_rating, language_code, publication_date, \
                     ratings_count, stock, rent_per_day, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        &book.id,
                        &book.external_id,
                        &book.title,
                        &book.authors,
                        &book.isbn,
                        &book.isbn13,
                        &book.publisher,
                        book.num_pages,
                        &book.average_rating,
                        &book.language_code,
                        &book.publication_date,
                        &book.ratings_count,
                        book.stock,
                        book.rent_per_day,
                        &book.created_at,
                        &book.updated_at,
                    ],
                )
                .map_err(|e| {
                    map_unique_violation(e, "Book with this external ID already exists")
                })?;
                Ok(())
            })
            .await
    }

    async fn update(&self, book: &Book) -> Result<()> {
        let book = book.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "UPDATE books SET external_id = ?, title = ?, authors = ?, isbn = ?, \
                     isbn13 = ?, publisher = ?, num_pages = ?, average_rating = ?, \
                     language_code = ?, publication_date = ?, ratings_count = ?, stock = ?, \
                     rent_per_day = ?, updated_at = STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now') \
                     WHERE id = ?",
                    rusqlite::params![
                        &book.external_id,
                        &book.title,
                        &book.authors,
                        &book.isbn,
                        &book.isbn13,
                        &book.publisher,
                        book.num_pages,
                        &book.average_rating,
                        &book.language_code,
                        &book.publication_date,
                        &book.ratings_count,
                        book.stock,
                        book.rent_per_day,
                        &book.id,
                    ],
                )
                .map_err(|e| {
                    map_unique_violation(e, "Book with this external ID already exists")
                })?;
                Ok(())
            })
            .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.execute("DELETE FROM books WHERE id = ?", [&id])
                    .map_err(LibraryError::DatabaseError)?;
                Ok(())
            })
            .await
    }
}

/// Repository for Member entities
pub struct MemberRepository {
    db: Arc<DatabaseManager>,
}

impl MemberRepository {
    /// Create a new MemberRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find a member by email (expects the lowercased form)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Member>> {
        let email = email.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM members WHERE email = ?", MEMBER_COLUMNS),
                    [&email],
                    Member::from_row,
                )
                .optional()
                .map_err(LibraryError::DatabaseError)
            })
            .await
    }

    /// Find one page of members, newest first, with the total count
    pub async fn list_paginated(&self, page: u32, limit: u32) -> Result<(Vec<Member>, usize)> {
        self.db
            .execute(move |conn| {
                let total: usize = conn
                    .query_row("SELECT COUNT(*) FROM members", [], |row| row.get(0))
                    .map_err(LibraryError::DatabaseError)?;

                let offset = page.saturating_sub(1) * limit;
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM members ORDER BY created_at DESC LIMIT ? OFFSET ?",
                        MEMBER_COLUMNS
                    ))
                    .map_err(LibraryError::DatabaseError)?;

                let members = stmt
                    .query_map(rusqlite::params![limit, offset], Member::from_row)
                    .map_err(LibraryError::DatabaseError)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(LibraryError::DatabaseError)?;

                Ok((members, total))
            })
            .await
    }

    /// Case-insensitive substring search over name and email, newest first
    pub async fn search(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Member>, usize)> {
        let pattern = format!("%{}%", query);
        self.db
            .execute(move |conn| {
                let total: usize = conn
                    .query_row(
                        "SELECT COUNT(*) FROM members WHERE name LIKE ?1 OR email LIKE ?1",
                        [&pattern],
                        |row| row.get(0),
                    )
                    .map_err(LibraryError::DatabaseError)?;

                let offset = page.saturating_sub(1) * limit;
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM members WHERE name LIKE ?1 OR email LIKE ?1 \
                         ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
                        MEMBER_COLUMNS
                    ))
                    .map_err(LibraryError::DatabaseError)?;

                let members = stmt
                    .query_map(rusqlite::params![pattern, limit, offset], Member::from_row)
                    .map_err(LibraryError::DatabaseError)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(LibraryError::DatabaseError)?;

                Ok((members, total))
            })
            .await
    }
}

#[async_trait]
impl Repository<Member> for MemberRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Member>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM members WHERE id = ?", MEMBER_COLUMNS),
                    [&id],
                    Member::from_row,
                )
                .optional()
                .map_err(LibraryError::DatabaseError)
            })
            .await
    }

    async fn find_all(&self) -> Result<Vec<Member>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM members ORDER BY created_at DESC",
                        MEMBER_COLUMNS
                    ))
                    .map_err(LibraryError::DatabaseError)?;

                let members = stmt
                    .query_map([], Member::from_row)
                    .map_err(LibraryError::DatabaseError)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(LibraryError::DatabaseError)?;

                Ok(members)
            })
            .await
    }

    async fn create(&self, member: &Member) -> Result<()> {
        let member = member.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO members (id, name, email, phone, outstanding_debt, \
                     created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        &member.id,
                        &member.name,
                        &member.email,
                        &member.phone,
                        member.outstanding_debt,
                        &member.created_at,
                        &member.updated_at,
                    ],
                )
                .map_err(|e| map_unique_violation(e, "Member with this email already exists"))?;
                Ok(())
            })
            .await
    }

    async fn update(&self, member: &Member) -> Result<()> {
        let member = member.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "UPDATE members SET name = ?, email = ?, phone = ?, outstanding_debt = ?, \
                     updated_at = STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
                    rusqlite::params![
                        &member.name,
                        &member.email,
                        &member.phone,
                        member.outstanding_debt,
                        &member.id,
                    ],
                )
                .map_err(|e| map_unique_violation(e, "Member with this email already exists"))?;
                Ok(())
            })
            .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.execute("DELETE FROM members WHERE id = ?", [&id])
                    .map_err(LibraryError::DatabaseError)?;
                Ok(())
            })
            .await
    }
}

/// Repository for the loan ledger.
///
/// Ledger rows are inserted and transitioned by the lending workflow inside
/// its own storage transactions; this repository only reads.
pub struct TransactionRepository {
    db: Arc<DatabaseManager>,
}

impl TransactionRepository {
    /// Create a new TransactionRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find a ledger entry by its ID
    pub async fn find_by_id(&self, id: &str) -> Result<Option<LoanTransaction>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!(
                        "SELECT {} FROM transactions WHERE id = ?",
                        TRANSACTION_COLUMNS
                    ),
                    [&id],
                    LoanTransaction::from_row,
                )
                .optional()
                .map_err(LibraryError::DatabaseError)
            })
            .await
    }

    /// All ledger entries, newest first, with book and member fields
    /// denormalized for display
    pub async fn list_all(&self) -> Result<Vec<LoanRecord>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT t.id, t.book_id, t.member_id, t.issue_date, t.return_date, \
                         t.rent_fee, t.status, t.created_at, t.updated_at, \
                         b.title, b.authors, m.name, m.email \
                         FROM transactions t \
                         JOIN books b ON b.id = t.book_id \
                         JOIN members m ON m.id = t.member_id \
                         ORDER BY t.created_at DESC",
                    )
                    .map_err(LibraryError::DatabaseError)?;

                let records = stmt
                    .query_map([], loan_record_from_row)
                    .map_err(LibraryError::DatabaseError)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(LibraryError::DatabaseError)?;

                Ok(records)
            })
            .await
    }

    /// Ledger entries for one member, newest first
    pub async fn list_by_member(&self, member_id: &str) -> Result<Vec<LoanRecord>> {
        let member_id = member_id.to_string();
        self.db
            .execute(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT t.id, t.book_id, t.member_id, t.issue_date, t.return_date, \
                         t.rent_fee, t.status, t.created_at, t.updated_at, \
                         b.title, b.authors, m.name, m.email \
                         FROM transactions t \
                         JOIN books b ON b.id = t.book_id \
                         JOIN members m ON m.id = t.member_id \
                         WHERE t.member_id = ? \
                         ORDER BY t.created_at DESC",
                    )
                    .map_err(LibraryError::DatabaseError)?;

                let records = stmt
                    .query_map([&member_id], loan_record_from_row)
                    .map_err(LibraryError::DatabaseError)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(LibraryError::DatabaseError)?;

                Ok(records)
            })
            .await
    }
}

fn loan_record_from_row(row: &rusqlite::Row) -> rusqlite::Result<LoanRecord> {
    Ok(LoanRecord {
        transaction: LoanTransaction::from_row(row)?,
        book_title: row.get(9)?,
        book_authors: row.get(10)?,
        member_name: row.get(11)?,
        member_email: row.get(12)?,
    })
}
