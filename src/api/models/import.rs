use super::books::BookResponse;
use super::common::deserialize_number_or_string;
use serde::{Deserialize, Serialize};

// Import API models

/// Request body for a bulk import run.
///
/// `pages` is the target number of new books (the upstream serves 20 per
/// page); it defaults to 20 when absent or falsy.
#[derive(Debug, Default, Deserialize)]
pub struct ImportBooksRequest {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "deserialize_number_or_string")]
    pub pages: Option<f64>,
}

/// Response for a finished import run
#[derive(Debug, Serialize)]
pub struct ImportBooksResponse {
    pub message: String,
    pub count: usize,
    pub books: Vec<BookResponse>,
}
