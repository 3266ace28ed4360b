//! Lending workflow service
//!
//! The core of the backend: issuing a book to a member and taking it back,
//! with rent accrual and debt-ceiling enforcement. Every mutation runs inside
//! one storage transaction; the stock decrement and the debt increment are
//! conditional UPDATEs whose affected-row counts are re-checked, so two
//! concurrent requests can never over-issue a book or push a member past the
//! ceiling.

use crate::core::error::{LibraryError, Result};
use crate::db::manager::DatabaseManager;
use crate::db::models::{
    Book, LoanRecord, LoanTransaction, Member, STATUS_ISSUED, STATUS_RETURNED, BOOK_COLUMNS,
    MEMBER_COLUMNS, TRANSACTION_COLUMNS,
};
use crate::db::repository::TransactionRepository;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{OptionalExtension, Transaction};
use std::sync::Arc;
use uuid::Uuid;

/// Maximum outstanding debt a member may carry, in rupees
pub const DEBT_CEILING: f64 = 500.0;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Outcome of a successful return
#[derive(Debug, Clone)]
pub struct ReturnOutcome {
    pub transaction: LoanTransaction,
    /// The member's outstanding debt after the fee was added
    pub member_debt: f64,
}

/// Coordinates issue and return against the catalog, member registry, and
/// loan ledger.
pub struct LendingService {
    db: Arc<DatabaseManager>,
    ledger: Arc<TransactionRepository>,
}

impl LendingService {
    /// Create a new LendingService
    pub fn new(db: Arc<DatabaseManager>, ledger: Arc<TransactionRepository>) -> Self {
        Self { db, ledger }
    }

    /// Issue a book to a member.
    ///
    /// Preconditions, each a distinct rejection: both ids supplied, book
    /// exists, stock available, member exists, member below the debt
    /// ceiling, no open loan for this (book, member) pair. On success the
    /// stock decrement and the ledger insert commit together.
    pub async fn issue(&self, book_id: &str, member_id: &str) -> Result<LoanTransaction> {
        if book_id.trim().is_empty() || member_id.trim().is_empty() {
            return Err(LibraryError::ValidationError(
                "Book ID and Member ID are required.".to_string(),
            ));
        }

        let book_id = book_id.to_string();
        let member_id = member_id.to_string();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        self.db
            .transaction(move |tx| {
                let book = book_in_tx(tx, &book_id)?
                    .ok_or_else(|| LibraryError::NotFound("Book not found.".to_string()))?;

                if book.stock <= 0 {
                    return Err(LibraryError::business_rule("Book not available in stock."));
                }

                let member = member_in_tx(tx, &member_id)?
                    .ok_or_else(|| LibraryError::NotFound("Member not found.".to_string()))?;

                if member.outstanding_debt >= DEBT_CEILING {
                    return Err(LibraryError::business_rule(
                        "Member outstanding debt exceeds \u{20b9}500. Cannot issue new books.",
                    ));
                }

                let open_loans: i64 = tx
                    .query_row(
                        "SELECT COUNT(*) FROM transactions \
                         WHERE book_id = ? AND member_id = ? AND status = ?",
                        rusqlite::params![&book_id, &member_id, STATUS_ISSUED],
                        |row| row.get(0),
                    )
                    .map_err(LibraryError::DatabaseError)?;

                if open_loans > 0 {
                    return Err(LibraryError::business_rule(
                        "Member has already issued this book.",
                    ));
                }

                // Conditional decrement: the WHERE clause re-validates the
                // stock we read above against the stored value.
                let changed = tx
                    .execute(
                        "UPDATE books SET stock = stock - 1, updated_at = ?1 \
                         WHERE id = ?2 AND stock > 0",
                        rusqlite::params![&now, &book_id],
                    )
                    .map_err(LibraryError::DatabaseError)?;

                if changed == 0 {
                    return Err(LibraryError::business_rule("Book not available in stock."));
                }

                tx.execute(
                    "INSERT INTO transactions (id, book_id, member_id, issue_date, status, \
                     created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        &id,
                        &book_id,
                        &member_id,
                        &now,
                        STATUS_ISSUED,
                        &now,
                        &now
                    ],
                )
                .map_err(LibraryError::DatabaseError)?;

                Ok(LoanTransaction {
                    id,
                    book_id,
                    member_id,
                    issue_date: now.clone(),
                    return_date: None,
                    rent_fee: 0.0,
                    status: STATUS_ISSUED.to_string(),
                    created_at: now.clone(),
                    updated_at: now,
                })
            })
            .await
    }

    /// Return a previously issued book.
    ///
    /// Computes the rent fee from ceiling-rounded elapsed days, re-validates
    /// the member's debt against the ceiling on a fresh read, and commits the
    /// ledger transition, debt increment, and stock restore as one unit. A
    /// rejection leaves every row untouched.
    pub async fn return_book(
        &self,
        transaction_id: &str,
        return_date: Option<DateTime<Utc>>,
    ) -> Result<ReturnOutcome> {
        if transaction_id.trim().is_empty() {
            return Err(LibraryError::ValidationError(
                "Transaction ID is required.".to_string(),
            ));
        }

        let transaction_id = transaction_id.to_string();
        let effective_return = return_date.unwrap_or_else(Utc::now);
        let now = Utc::now().to_rfc3339();

        self.db
            .transaction(move |tx| {
                let mut loan = transaction_in_tx(tx, &transaction_id)?
                    .ok_or_else(|| LibraryError::NotFound("Transaction not found.".to_string()))?;

                if loan.status == STATUS_RETURNED {
                    return Err(LibraryError::business_rule(
                        "This book has already been returned.",
                    ));
                }

                let book = book_in_tx(tx, &loan.book_id)?
                    .ok_or_else(|| LibraryError::NotFound("Book not found.".to_string()))?;
                let member = member_in_tx(tx, &loan.member_id)?
                    .ok_or_else(|| LibraryError::NotFound("Member not found.".to_string()))?;

                let issued = parse_stored_date(&loan.issue_date)?;
                let days = days_borrowed(issued, effective_return);
                let rent_fee = days as f64 * book.rent_per_day;

                let new_debt = member.outstanding_debt + rent_fee;
                let over_ceiling = || LibraryError::BusinessRule {
                    message: format!(
                        "Cannot return book. Total debt would be \u{20b9}{}, exceeding the \u{20b9}500 limit.",
                        new_debt
                    ),
                    details: Some(serde_json::json!({
                        "currentDebt": member.outstanding_debt,
                        "rentFee": rent_fee,
                        "totalDebt": new_debt,
                    })),
                };

                if new_debt > DEBT_CEILING {
                    return Err(over_ceiling());
                }

                let return_stamp = effective_return.to_rfc3339();
                let changed = tx
                    .execute(
                        "UPDATE transactions SET return_date = ?1, rent_fee = ?2, status = ?3, \
                         updated_at = ?4 WHERE id = ?5 AND status = ?6",
                        rusqlite::params![
                            &return_stamp,
                            rent_fee,
                            STATUS_RETURNED,
                            &now,
                            &loan.id,
                            STATUS_ISSUED
                        ],
                    )
                    .map_err(LibraryError::DatabaseError)?;

                if changed == 0 {
                    return Err(LibraryError::business_rule(
                        "This book has already been returned.",
                    ));
                }

                // Conditional increment: re-validated against the latest
                // stored debt, not the value read above.
                let changed = tx
                    .execute(
                        "UPDATE members SET outstanding_debt = outstanding_debt + ?1, \
                         updated_at = ?2 WHERE id = ?3 AND outstanding_debt + ?1 <= ?4",
                        rusqlite::params![rent_fee, &now, &loan.member_id, DEBT_CEILING],
                    )
                    .map_err(LibraryError::DatabaseError)?;

                if changed == 0 {
                    return Err(over_ceiling());
                }

                tx.execute(
                    "UPDATE books SET stock = stock + 1, updated_at = ?1 WHERE id = ?2",
                    rusqlite::params![&now, &loan.book_id],
                )
                .map_err(LibraryError::DatabaseError)?;

                loan.return_date = Some(return_stamp);
                loan.rent_fee = rent_fee;
                loan.status = STATUS_RETURNED.to_string();
                loan.updated_at = now;

                Ok(ReturnOutcome {
                    transaction: loan,
                    member_debt: new_debt,
                })
            })
            .await
    }

    /// All ledger entries, newest first, denormalized for display
    pub async fn list_all(&self) -> Result<Vec<LoanRecord>> {
        self.ledger.list_all().await
    }

    /// Ledger entries for one member, newest first
    pub async fn list_by_member(&self, member_id: &str) -> Result<Vec<LoanRecord>> {
        if member_id.trim().is_empty() {
            return Err(LibraryError::ValidationError(
                "Member ID is required.".to_string(),
            ));
        }
        self.ledger.list_by_member(member_id).await
    }
}

/// Days charged for a loan: elapsed time rounded up to whole days.
///
/// Zero or negative elapsed time charges zero days; any positive fraction of
/// a day charges the full day.
pub fn days_borrowed(issued: DateTime<Utc>, returned: DateTime<Utc>) -> i64 {
    let elapsed_ms = returned.signed_duration_since(issued).num_milliseconds();
    if elapsed_ms <= 0 {
        return 0;
    }
    (elapsed_ms + DAY_MS - 1) / DAY_MS
}

/// Parse a caller-supplied return date: RFC 3339, or a plain `YYYY-MM-DD`
/// taken as midnight UTC.
pub fn parse_return_date(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = raw.parse::<NaiveDate>() {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }
    Err(LibraryError::ValidationError(format!(
        "Invalid return date: {}",
        raw
    )))
}

fn parse_stored_date(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LibraryError::TaskError(format!("Malformed stored date {}: {}", raw, e)))
}

fn book_in_tx(tx: &Transaction, id: &str) -> Result<Option<Book>> {
    tx.query_row(
        &format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS),
        [id],
        Book::from_row,
    )
    .optional()
    .map_err(LibraryError::DatabaseError)
}

fn member_in_tx(tx: &Transaction, id: &str) -> Result<Option<Member>> {
    tx.query_row(
        &format!("SELECT {} FROM members WHERE id = ?", MEMBER_COLUMNS),
        [id],
        Member::from_row,
    )
    .optional()
    .map_err(LibraryError::DatabaseError)
}

fn transaction_in_tx(tx: &Transaction, id: &str) -> Result<Option<LoanTransaction>> {
    tx.query_row(
        &format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS),
        [id],
        LoanTransaction::from_row,
    )
    .optional()
    .map_err(LibraryError::DatabaseError)
}
