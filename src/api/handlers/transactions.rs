use super::AppState;
use crate::api::models::{
    IssueBookRequest, IssueResponse, ReturnBookRequest, ReturnResponse, TransactionRecordResponse,
    TransactionResponse, TransactionsListResponse,
};
use crate::core::error::Result;
use crate::core::lending::parse_return_date;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// Handler for POST /api/transactions/issue - Issue a book to a member
pub async fn issue_book(
    State(state): State<AppState>,
    Json(req): Json<IssueBookRequest>,
) -> Result<impl IntoResponse> {
    let transaction = state
        .lending_service
        .issue(
            req.book_id.as_deref().unwrap_or(""),
            req.member_id.as_deref().unwrap_or(""),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueResponse {
            message: "Book issued successfully.".to_string(),
            transaction: TransactionResponse::from(transaction),
        }),
    ))
}

/// Handler for PUT /api/transactions/return/:id - Return an issued book
pub async fn return_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<ReturnBookRequest>>,
) -> Result<impl IntoResponse> {
    let return_date = match body.and_then(|Json(req)| req.return_date) {
        Some(raw) => Some(parse_return_date(&raw)?),
        None => None,
    };

    let outcome = state.lending_service.return_book(&id, return_date).await?;

    Ok(Json(ReturnResponse {
        message: format!(
            "Book returned successfully. Rent Fee: \u{20b9}{}",
            outcome.transaction.rent_fee
        ),
        transaction: TransactionResponse::from(outcome.transaction),
        member_debt: outcome.member_debt,
    }))
}

/// Handler for GET /api/transactions - All ledger entries, newest first
pub async fn list_transactions(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let records = state.lending_service.list_all().await?;

    Ok(Json(TransactionsListResponse {
        total: records.len(),
        transactions: records
            .into_iter()
            .map(TransactionRecordResponse::from)
            .collect(),
    }))
}

/// Handler for GET /api/transactions/member/:memberId - One member's ledger
pub async fn list_member_transactions(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> Result<impl IntoResponse> {
    let records = state.lending_service.list_by_member(&member_id).await?;

    Ok(Json(TransactionsListResponse {
        total: records.len(),
        transactions: records
            .into_iter()
            .map(TransactionRecordResponse::from)
            .collect(),
    }))
}
