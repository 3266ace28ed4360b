use super::AppState;
use crate::api::models::{
    page_count, BookEnvelope, BookMessageResponse, BookResponse, BookSearchResponse,
    BooksListResponse, CreateBookRequest, PageQuery, SearchQuery, UpdateBookRequest,
};
use crate::core::error::{LibraryError, Result};
use crate::db::models::Book;
use crate::db::repository::Repository;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

/// Handler for POST /api/books - Add a book to the catalog
pub async fn create_book(
    State(state): State<AppState>,
    Json(req): Json<CreateBookRequest>,
) -> Result<impl IntoResponse> {
    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let authors = req
        .authors
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());

    let (title, authors) = match (title, authors) {
        (Some(t), Some(a)) => (t.to_string(), a.to_string()),
        _ => {
            return Err(LibraryError::ValidationError(
                "Title and Authors are required.".to_string(),
            ))
        }
    };

    if let Some(external_id) = req.external_id.as_deref() {
        if state
            .book_repo
            .find_by_external_id(external_id)
            .await?
            .is_some()
        {
            return Err(LibraryError::Conflict(
                "Book with this external ID already exists".to_string(),
            ));
        }
    }

    let now = Utc::now().to_rfc3339();
    let book = Book {
        id: Uuid::new_v4().to_string(),
        external_id: req.external_id,
        title,
        authors,
        isbn: req.isbn.unwrap_or_default(),
        isbn13: req.isbn13.unwrap_or_default(),
        publisher: req.publisher.unwrap_or_default(),
        num_pages: req.num_pages.unwrap_or(0.0) as i64,
        average_rating: req.average_rating.unwrap_or_else(|| "0".to_string()),
        language_code: req.language_code.unwrap_or_else(|| "eng".to_string()),
        publication_date: req.publication_date.unwrap_or_default(),
        ratings_count: req.ratings_count.unwrap_or_else(|| "0".to_string()),
        // Zero counts as "not provided" here, so the defaults apply
        stock: match req.stock {
            Some(v) if v != 0.0 => v as i64,
            _ => 1,
        },
        rent_per_day: match req.rent_per_day {
            Some(v) if v != 0.0 => v,
            _ => 10.0,
        },
        created_at: now.clone(),
        updated_at: now,
    };

    state.book_repo.create(&book).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookMessageResponse {
            message: "Book created".to_string(),
            book: BookResponse::from(book),
        }),
    ))
}

/// Handler for GET /api/books - List books, newest first, paginated
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let (page, limit) = params.normalized();
    let (books, total) = state.book_repo.list_paginated(page, limit).await?;

    Ok(Json(BooksListResponse {
        page,
        limit,
        total,
        pages: page_count(total, limit),
        books: books.into_iter().map(BookResponse::from).collect(),
    }))
}

/// Handler for GET /api/books/:id - Get book by ID
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let book = state
        .book_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| LibraryError::NotFound("Book not found".to_string()))?;

    Ok(Json(BookEnvelope {
        book: BookResponse::from(book),
    }))
}

/// Handler for PUT /api/books/:id - Update a book
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<impl IntoResponse> {
    let existing = state
        .book_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| LibraryError::NotFound("Book not found.".to_string()))?;

    let updated = Book {
        id: existing.id,
        external_id: req.external_id.or(existing.external_id),
        title: req
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or(existing.title),
        authors: req
            .authors
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or(existing.authors),
        isbn: req.isbn.unwrap_or(existing.isbn),
        isbn13: req.isbn13.unwrap_or(existing.isbn13),
        publisher: req.publisher.unwrap_or(existing.publisher),
        num_pages: req
            .num_pages
            .map(|v| v as i64)
            .unwrap_or(existing.num_pages),
        average_rating: req.average_rating.unwrap_or(existing.average_rating),
        language_code: req.language_code.unwrap_or(existing.language_code),
        publication_date: req.publication_date.unwrap_or(existing.publication_date),
        ratings_count: req.ratings_count.unwrap_or(existing.ratings_count),
        stock: req.stock.map(|v| v as i64).unwrap_or(existing.stock),
        rent_per_day: req.rent_per_day.unwrap_or(existing.rent_per_day),
        created_at: existing.created_at,
        updated_at: existing.updated_at,
    };

    if updated.stock < 0 {
        return Err(LibraryError::ValidationError(
            "stock cannot be negative".to_string(),
        ));
    }
    if updated.rent_per_day < 0.0 {
        return Err(LibraryError::ValidationError(
            "rentPerDay cannot be negative".to_string(),
        ));
    }

    state.book_repo.update(&updated).await?;

    Ok(Json(BookMessageResponse {
        message: "Book updated".to_string(),
        book: BookResponse::from(updated),
    }))
}

/// Handler for GET /api/books/search?q= - Relevance-ranked catalog search
pub async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let q = params.q.trim().to_string();
    if q.is_empty() {
        return Err(LibraryError::ValidationError(
            "Query parameter q is required".to_string(),
        ));
    }

    let (page, limit) = params.normalized();
    let (books, total) = state.book_repo.search(&q, page, limit).await?;

    Ok(Json(BookSearchResponse {
        q,
        page,
        limit,
        total,
        pages: page_count(total, limit),
        results: books.into_iter().map(BookResponse::from).collect(),
    }))
}
