//! Database migrations
//!
//! This module provides versioned schema migration with a tracking table.

use crate::core::error::{LibraryError, Result};
use rusqlite::Connection;
use tracing::info;

/// Migration version tracking table
const MIGRATION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Initial schema migration (version 1)
const MIGRATION_V1: &str = r#"
-- Books table (catalog)
CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    external_id TEXT UNIQUE,
    title TEXT NOT NULL,
    authors TEXT NOT NULL,
    isbn TEXT NOT NULL DEFAULT '',
    isbn13 TEXT NOT NULL DEFAULT '',
    publisher TEXT NOT NULL DEFAULT '',
    num_pages INTEGER NOT NULL DEFAULT 0,
    average_rating TEXT NOT NULL DEFAULT '0',
    language_code TEXT NOT NULL DEFAULT 'eng',
    publication_date TEXT NOT NULL DEFAULT '',
    ratings_count TEXT NOT NULL DEFAULT '0',
    stock INTEGER NOT NULL DEFAULT 1 CHECK (stock >= 0),
    rent_per_day REAL NOT NULL DEFAULT 10 CHECK (rent_per_day >= 0),
    created_at DATETIME DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at DATETIME DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_books_created_at ON books(created_at);

-- Members table (registry)
CREATE TABLE IF NOT EXISTS members (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    phone TEXT NOT NULL DEFAULT '',
    outstanding_debt REAL NOT NULL DEFAULT 0
        CHECK (outstanding_debt >= 0 AND outstanding_debt <= 500),
    created_at DATETIME DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at DATETIME DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_members_created_at ON members(created_at);

-- Loan ledger: one row per issue, updated once on return, never deleted
CREATE TABLE IF NOT EXISTS transactions (
    id TEXT PRIMARY KEY,
    book_id TEXT NOT NULL,
    member_id TEXT NOT NULL,
    issue_date DATETIME NOT NULL,
    return_date DATETIME,
    rent_fee REAL NOT NULL DEFAULT 0 CHECK (rent_fee >= 0),
    status TEXT NOT NULL DEFAULT 'issued' CHECK (status IN ('issued', 'returned')),
    created_at DATETIME DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at DATETIME DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')),
    FOREIGN KEY (book_id) REFERENCES books(id),
    FOREIGN KEY (member_id) REFERENCES members(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_member ON transactions(member_id);
CREATE INDEX IF NOT EXISTS idx_transactions_pair_status
    ON transactions(book_id, member_id, status);
CREATE INDEX IF NOT EXISTS idx_transactions_created_at ON transactions(created_at);
"#;

/// All migrations in order; the index + 1 is the schema version
const MIGRATIONS: &[&str] = &[MIGRATION_V1];

/// Run all pending migrations against the connection
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(MIGRATION_TABLE)
        .map_err(LibraryError::DatabaseError)?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(LibraryError::DatabaseError)?;

    for (idx, migration) in MIGRATIONS.iter().enumerate() {
        let version = (idx + 1) as i64;
        if version <= current_version {
            continue;
        }

        info!(version, "Applying database migration");

        let tx = conn.transaction().map_err(LibraryError::DatabaseError)?;
        tx.execute_batch(migration)
            .map_err(LibraryError::DatabaseError)?;
        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?)",
            [version],
        )
        .map_err(LibraryError::DatabaseError)?;
        tx.commit().map_err(LibraryError::DatabaseError)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_memory_db() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_migrations_create_schema() {
        let mut conn = open_memory_db();
        run_migrations(&mut conn).unwrap();

        for table in ["books", "members", "transactions"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {}", table);
        }
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let mut conn = open_memory_db();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, MIGRATIONS.len() as i64);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(rows, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_stock_cannot_go_negative() {
        let mut conn = open_memory_db();
        run_migrations(&mut conn).unwrap();

        conn.execute(
            "INSERT INTO books (id, title, authors, stock) VALUES ('b1', 'Dune', 'Frank Herbert', 0)",
            [],
        )
        .unwrap();

        let result = conn.execute("UPDATE books SET stock = stock - 1 WHERE id = 'b1'", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_debt_ceiling_constraint() {
        let mut conn = open_memory_db();
        run_migrations(&mut conn).unwrap();

        conn.execute(
            "INSERT INTO members (id, name, email, outstanding_debt) \
             VALUES ('m1', 'Ada', 'ada@example.com', 499)",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "UPDATE members SET outstanding_debt = outstanding_debt + 10 WHERE id = 'm1'",
            [],
        );
        assert!(result.is_err());
    }
}
