use super::AppState;
use crate::api::models::{BookResponse, ImportBooksRequest, ImportBooksResponse};
use crate::core::error::Result;
use crate::core::import::ImportFilters;
use axum::{extract::State, response::IntoResponse, Json};
use tracing::info;

/// Handler for POST /api/import - Bulk-import books from the external catalog
pub async fn import_books(
    State(state): State<AppState>,
    Json(req): Json<ImportBooksRequest>,
) -> Result<impl IntoResponse> {
    let filters = ImportFilters {
        title: req.title.filter(|s| !s.trim().is_empty()),
        authors: req.authors.filter(|s| !s.trim().is_empty()),
        isbn: req.isbn.filter(|s| !s.trim().is_empty()),
        publisher: req.publisher.filter(|s| !s.trim().is_empty()),
    };
    let target_count = match req.pages {
        Some(v) if v > 0.0 => v as u32,
        _ => 0, // the service substitutes its default page size
    };

    let outcome = state.import_service.import(filters, target_count).await?;
    let count = outcome.imported.len();

    info!(count, "Import request finished");

    Ok(Json(ImportBooksResponse {
        message: format!("Successfully imported {} new books.", count),
        count,
        books: outcome
            .imported
            .into_iter()
            .map(BookResponse::from)
            .collect(),
    }))
}
