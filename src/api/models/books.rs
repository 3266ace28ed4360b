use super::common::{
    deserialize_display_string, deserialize_number_or_string, deserialize_string_or_seq,
};
use crate::db::models::Book;
use serde::{Deserialize, Serialize};

// Book API models

/// Request body for creating a new book
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookRequest {
    /// External catalog identifier, unique when present
    #[serde(
        rename = "bookID",
        default,
        deserialize_with = "deserialize_display_string"
    )]
    pub external_id: Option<String>,
    pub title: Option<String>,
    /// A single string or a sequence of strings
    #[serde(default, deserialize_with = "deserialize_string_or_seq")]
    pub authors: Option<String>,
    #[serde(default, deserialize_with = "deserialize_display_string")]
    pub isbn: Option<String>,
    #[serde(default, deserialize_with = "deserialize_display_string")]
    pub isbn13: Option<String>,
    #[serde(default, deserialize_with = "deserialize_display_string")]
    pub publisher: Option<String>,
    #[serde(
        rename = "numPages",
        default,
        deserialize_with = "deserialize_number_or_string"
    )]
    pub num_pages: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_number_or_string")]
    pub stock: Option<f64>,
    #[serde(
        rename = "rentPerDay",
        default,
        deserialize_with = "deserialize_number_or_string"
    )]
    pub rent_per_day: Option<f64>,
    #[serde(
        rename = "averageRating",
        default,
        deserialize_with = "deserialize_display_string"
    )]
    pub average_rating: Option<String>,
    #[serde(
        rename = "languageCode",
        default,
        deserialize_with = "deserialize_display_string"
    )]
    pub language_code: Option<String>,
    #[serde(
        rename = "publicationDate",
        default,
        deserialize_with = "deserialize_display_string"
    )]
    pub publication_date: Option<String>,
    #[serde(
        rename = "ratingsCount",
        default,
        deserialize_with = "deserialize_display_string"
    )]
    pub ratings_count: Option<String>,
}

/// Request body for updating a book; absent fields keep their stored value
#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    #[serde(
        rename = "bookID",
        default,
        deserialize_with = "deserialize_display_string"
    )]
    pub external_id: Option<String>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_or_seq")]
    pub authors: Option<String>,
    #[serde(default, deserialize_with = "deserialize_display_string")]
    pub isbn: Option<String>,
    #[serde(default, deserialize_with = "deserialize_display_string")]
    pub isbn13: Option<String>,
    #[serde(default, deserialize_with = "deserialize_display_string")]
    pub publisher: Option<String>,
    #[serde(
        rename = "numPages",
        default,
        deserialize_with = "deserialize_number_or_string"
    )]
    pub num_pages: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_number_or_string")]
    pub stock: Option<f64>,
    #[serde(
        rename = "rentPerDay",
        default,
        deserialize_with = "deserialize_number_or_string"
    )]
    pub rent_per_day: Option<f64>,
    #[serde(
        rename = "averageRating",
        default,
        deserialize_with = "deserialize_display_string"
    )]
    pub average_rating: Option<String>,
    #[serde(
        rename = "languageCode",
        default,
        deserialize_with = "deserialize_display_string"
    )]
    pub language_code: Option<String>,
    #[serde(
        rename = "publicationDate",
        default,
        deserialize_with = "deserialize_display_string"
    )]
    pub publication_date: Option<String>,
    #[serde(
        rename = "ratingsCount",
        default,
        deserialize_with = "deserialize_display_string"
    )]
    pub ratings_count: Option<String>,
}

/// Response for book operations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: String,
    #[serde(rename = "bookID", skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub title: String,
    pub authors: String,
    pub isbn: String,
    pub isbn13: String,
    pub publisher: String,
    pub num_pages: i64,
    pub average_rating: String,
    pub language_code: String,
    pub publication_date: String,
    pub ratings_count: String,
    pub stock: i64,
    pub rent_per_day: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            external_id: book.external_id,
            title: book.title,
            authors: book.authors,
            isbn: book.isbn,
            isbn13: book.isbn13,
            publisher: book.publisher,
            num_pages: book.num_pages,
            average_rating: book.average_rating,
            language_code: book.language_code,
            publication_date: book.publication_date,
            ratings_count: book.ratings_count,
            stock: book.stock,
            rent_per_day: book.rent_per_day,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// Envelope for create/update responses
#[derive(Debug, Serialize)]
pub struct BookMessageResponse {
    pub message: String,
    pub book: BookResponse,
}

/// Envelope for a single fetched book
#[derive(Debug, Serialize)]
pub struct BookEnvelope {
    pub book: BookResponse,
}

/// Paginated book listing
#[derive(Debug, Serialize)]
pub struct BooksListResponse {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub pages: u32,
    pub books: Vec<BookResponse>,
}

/// Paginated search results, echoing the query
#[derive(Debug, Serialize)]
pub struct BookSearchResponse {
    pub q: String,
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub pages: u32,
    pub results: Vec<BookResponse>,
}
