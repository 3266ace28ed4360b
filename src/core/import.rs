//! Bulk import from the external book catalog
//!
//! Fetches fixed-size pages from the upstream catalog API and inserts the
//! records that are not already present, keyed by their external identifier.
//! The upstream cannot be told to stop early, so a page may contain fewer
//! usable records than requested.

use crate::core::error::{LibraryError, Result};
use crate::db::models::Book;
use crate::db::repository::{BookRepository, Repository};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Records per upstream page; fixed by the external API
pub const PAGE_SIZE: u32 = 20;

const DEFAULT_RENT_PER_DAY: f64 = 10.0;

/// Filter criteria forwarded to the upstream catalog on every page request
#[derive(Debug, Clone, Default)]
pub struct ImportFilters {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
}

/// One record as returned by the upstream catalog.
///
/// The upstream is loose with types: numeric-looking fields arrive as JSON
/// numbers or strings interchangeably. Everything except `num_pages` is kept
/// as an opaque display string.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalBook {
    #[serde(rename = "bookID", default, deserialize_with = "de_display_string")]
    pub book_id: Option<String>,
    #[serde(default, deserialize_with = "de_display_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_display_string")]
    pub authors: Option<String>,
    #[serde(default, deserialize_with = "de_display_string")]
    pub isbn: Option<String>,
    #[serde(default, deserialize_with = "de_display_string")]
    pub isbn13: Option<String>,
    #[serde(default, deserialize_with = "de_display_string")]
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "de_number")]
    pub num_pages: Option<f64>,
    #[serde(default, deserialize_with = "de_display_string")]
    pub average_rating: Option<String>,
    #[serde(default, deserialize_with = "de_display_string")]
    pub language_code: Option<String>,
    #[serde(default, deserialize_with = "de_display_string")]
    pub publication_date: Option<String>,
    #[serde(default, deserialize_with = "de_display_string")]
    pub ratings_count: Option<String>,
}

impl ExternalBook {
    /// Build a catalog entry with default stock 1, or None when the record
    /// lacks the fields a book requires.
    fn into_book(self) -> Option<Book> {
        let external_id = self.book_id?;
        let title = self.title?;
        let authors = self.authors?;
        let now = Utc::now().to_rfc3339();

        Some(Book {
            id: Uuid::new_v4().to_string(),
            external_id: Some(external_id),
            title,
            authors,
            isbn: self.isbn.unwrap_or_default(),
            isbn13: self.isbn13.unwrap_or_default(),
            publisher: self.publisher.unwrap_or_default(),
            num_pages: self.num_pages.unwrap_or(0.0) as i64,
            average_rating: self.average_rating.unwrap_or_else(|| "0".to_string()),
            language_code: self.language_code.unwrap_or_else(|| "eng".to_string()),
            publication_date: self.publication_date.unwrap_or_default(),
            ratings_count: self.ratings_count.unwrap_or_else(|| "0".to_string()),
            stock: 1,
            rent_per_day: DEFAULT_RENT_PER_DAY,
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

/// Accept a string or a number, rendered as a display string; empty strings
/// and nulls become None.
fn de_display_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Deserialize::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept a number or a numeric string; anything else becomes None.
fn de_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Deserialize::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// A pageable source of external catalog records
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one fixed-size page (1-indexed) with the given filters
    async fn fetch_page(&self, page: u32, filters: &ImportFilters) -> Result<Vec<ExternalBook>>;
}

/// The Frappe library catalog over HTTP
pub struct FrappeCatalog {
    client: reqwest::Client,
    base_url: String,
}

/// Envelope the Frappe API wraps its records in
#[derive(Debug, Deserialize)]
struct FrappeResponse {
    #[serde(default)]
    message: Vec<ExternalBook>,
}

impl FrappeCatalog {
    /// Create a catalog client for the given base URL
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| LibraryError::UpstreamError(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl CatalogSource for FrappeCatalog {
    async fn fetch_page(&self, page: u32, filters: &ImportFilters) -> Result<Vec<ExternalBook>> {
        let mut params: Vec<(&str, String)> = vec![("page", page.to_string())];
        if let Some(title) = &filters.title {
            params.push(("title", title.clone()));
        }
        if let Some(authors) = &filters.authors {
            params.push(("authors", authors.clone()));
        }
        if let Some(isbn) = &filters.isbn {
            params.push(("isbn", isbn.clone()));
        }
        if let Some(publisher) = &filters.publisher {
            params.push(("publisher", publisher.clone()));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| LibraryError::UpstreamError(format!("Request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| LibraryError::UpstreamError(format!("Upstream returned error: {}", e)))?;

        let body: FrappeResponse = response
            .json()
            .await
            .map_err(|e| LibraryError::UpstreamError(format!("Malformed response: {}", e)))?;

        Ok(body.message)
    }
}

/// Result of an import run
#[derive(Debug)]
pub struct ImportOutcome {
    /// The newly created catalog entries, in import order
    pub imported: Vec<Book>,
}

/// Imports external catalog records into the book store
pub struct ImportService {
    catalog: Arc<dyn CatalogSource>,
    books: Arc<BookRepository>,
}

impl ImportService {
    /// Create a new ImportService
    pub fn new(catalog: Arc<dyn CatalogSource>, books: Arc<BookRepository>) -> Self {
        Self { catalog, books }
    }

    /// Fetch enough pages to cover `target_count` new books and insert the
    /// records whose external id is not yet in the catalog.
    ///
    /// An upstream failure after the first page stops fetching and returns
    /// the books already committed; a failure on the first page is an error.
    pub async fn import(&self, filters: ImportFilters, target_count: u32) -> Result<ImportOutcome> {
        let target = if target_count == 0 {
            PAGE_SIZE
        } else {
            target_count
        };
        let total_pages = (target + PAGE_SIZE - 1) / PAGE_SIZE;

        let mut imported: Vec<Book> = Vec::new();

        for page in 1..=total_pages {
            let records = match self.catalog.fetch_page(page, &filters).await {
                Ok(records) => records,
                Err(e) if imported.is_empty() => return Err(e),
                Err(e) => {
                    warn!(page, error = %e, "Upstream fetch failed mid-import, keeping partial results");
                    break;
                }
            };

            if records.is_empty() {
                debug!(page, "Upstream returned no records, stopping early");
                break;
            }

            // One batch existence check per page instead of a lookup per record
            let ids: Vec<String> = records.iter().filter_map(|r| r.book_id.clone()).collect();
            let mut existing = self.books.existing_external_ids(ids).await?;

            for record in records {
                let Some(external_id) = record.book_id.clone() else {
                    debug!("Skipping upstream record without an external id");
                    continue;
                };
                if existing.contains(&external_id) {
                    continue;
                }
                let Some(book) = record.into_book() else {
                    debug!(%external_id, "Skipping upstream record missing title or authors");
                    continue;
                };

                self.books.create(&book).await?;
                existing.insert(external_id);
                imported.push(book);
            }
        }

        debug!(count = imported.len(), "Import run finished");
        Ok(ImportOutcome { imported })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::manager::DatabaseManager;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn ext(id: &str, title: &str) -> ExternalBook {
        ExternalBook {
            book_id: Some(id.to_string()),
            title: Some(title.to_string()),
            authors: Some("Author".to_string()),
            isbn: None,
            isbn13: None,
            publisher: None,
            num_pages: Some(100.0),
            average_rating: None,
            language_code: None,
            publication_date: None,
            ratings_count: None,
        }
    }

    struct MockCatalog {
        pages: Vec<Vec<ExternalBook>>,
        calls: AtomicU32,
        fail_from_page: Option<u32>,
    }

    impl MockCatalog {
        fn new(pages: Vec<Vec<ExternalBook>>) -> Self {
            Self {
                pages,
                calls: AtomicU32::new(0),
                fail_from_page: None,
            }
        }

        fn failing_from(pages: Vec<Vec<ExternalBook>>, fail_from_page: u32) -> Self {
            Self {
                pages,
                calls: AtomicU32::new(0),
                fail_from_page: Some(fail_from_page),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogSource for MockCatalog {
        async fn fetch_page(
            &self,
            page: u32,
            _filters: &ImportFilters,
        ) -> Result<Vec<ExternalBook>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(fail_from) = self.fail_from_page {
                if page >= fail_from {
                    return Err(LibraryError::UpstreamError("connection refused".into()));
                }
            }
            Ok(self
                .pages
                .get((page - 1) as usize)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn service(catalog: Arc<MockCatalog>) -> (ImportService, Arc<BookRepository>) {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        let books = Arc::new(BookRepository::new(db));
        (ImportService::new(catalog, books.clone()), books)
    }

    fn full_page(start: u32) -> Vec<ExternalBook> {
        (start..start + PAGE_SIZE)
            .map(|i| ext(&i.to_string(), &format!("Book {}", i)))
            .collect()
    }

    #[tokio::test]
    async fn test_target_45_fetches_three_pages() {
        let catalog = Arc::new(MockCatalog::new(vec![
            full_page(1),
            full_page(21),
            full_page(41),
        ]));
        let (service, _books) = service(catalog.clone());

        let outcome = service
            .import(ImportFilters::default(), 45)
            .await
            .unwrap();

        assert_eq!(catalog.calls(), 3);
        assert_eq!(outcome.imported.len(), 60);
    }

    #[tokio::test]
    async fn test_existing_external_ids_are_skipped() {
        let catalog = Arc::new(MockCatalog::new(vec![vec![
            ext("1", "Known"),
            ext("2", "Fresh"),
        ]]));
        let (service, books) = service(catalog);

        // "1" is already in the catalog
        let seeded = ext("1", "Known").into_book().unwrap();
        books.create(&seeded).await.unwrap();

        let outcome = service
            .import(ImportFilters::default(), 10)
            .await
            .unwrap();

        assert_eq!(outcome.imported.len(), 1);
        assert_eq!(outcome.imported[0].external_id.as_deref(), Some("2"));
        assert_eq!(outcome.imported[0].stock, 1);
    }

    #[tokio::test]
    async fn test_mid_loop_failure_keeps_partial_results() {
        let catalog = Arc::new(MockCatalog::failing_from(vec![full_page(1)], 2));
        let (service, books) = service(catalog.clone());

        let outcome = service
            .import(ImportFilters::default(), 60)
            .await
            .unwrap();

        assert_eq!(catalog.calls(), 2);
        assert_eq!(outcome.imported.len(), PAGE_SIZE as usize);
        // The partial results were committed, not rolled back
        let (_, total) = books.list_paginated(1, 1).await.unwrap();
        assert_eq!(total, PAGE_SIZE as usize);
    }

    #[tokio::test]
    async fn test_first_page_failure_is_an_error() {
        let catalog = Arc::new(MockCatalog::failing_from(vec![], 1));
        let (service, _books) = service(catalog);

        let err = service
            .import(ImportFilters::default(), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::UpstreamError(_)));
    }

    #[tokio::test]
    async fn test_empty_page_stops_fetching() {
        let catalog = Arc::new(MockCatalog::new(vec![vec![ext("1", "Only")], vec![]]));
        let (service, _books) = service(catalog.clone());

        let outcome = service
            .import(ImportFilters::default(), 60)
            .await
            .unwrap();

        assert_eq!(catalog.calls(), 2);
        assert_eq!(outcome.imported.len(), 1);
    }

    #[tokio::test]
    async fn test_records_without_external_id_are_skipped() {
        let mut nameless = ext("ignored", "No ID");
        nameless.book_id = None;
        let catalog = Arc::new(MockCatalog::new(vec![vec![nameless, ext("7", "Kept")]]));
        let (service, _books) = service(catalog);

        let outcome = service
            .import(ImportFilters::default(), 10)
            .await
            .unwrap();
        assert_eq!(outcome.imported.len(), 1);
        assert_eq!(outcome.imported[0].title, "Kept");
    }

    #[test]
    fn test_external_book_tolerates_mixed_types() {
        let record: ExternalBook = serde_json::from_value(serde_json::json!({
            "bookID": 9001,
            "title": "Snow Crash",
            "authors": "Neal Stephenson",
            "num_pages": "470",
            "average_rating": 4.02,
            "ratings_count": 231452,
            "publication_date": "5/10/2006"
        }))
        .unwrap();

        assert_eq!(record.book_id.as_deref(), Some("9001"));
        assert_eq!(record.num_pages, Some(470.0));
        assert_eq!(record.average_rating.as_deref(), Some("4.02"));
        assert_eq!(record.ratings_count.as_deref(), Some("231452"));

        let book = record.into_book().unwrap();
        assert_eq!(book.num_pages, 470);
        assert_eq!(book.publication_date, "5/10/2006");
        assert_eq!(book.language_code, "eng");
        assert_eq!(book.stock, 1);
    }

    #[test]
    fn test_external_book_missing_fields_is_not_a_book() {
        let record: ExternalBook =
            serde_json::from_value(serde_json::json!({"bookID": "1"})).unwrap();
        assert!(record.into_book().is_none());
    }
}
