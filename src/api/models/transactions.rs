use crate::db::models::{LoanRecord, LoanTransaction};
use serde::{Deserialize, Serialize};

// Loan ledger API models

/// Request body for issuing a book
#[derive(Debug, Deserialize)]
pub struct IssueBookRequest {
    #[serde(rename = "bookId")]
    pub book_id: Option<String>,
    #[serde(rename = "memberId")]
    pub member_id: Option<String>,
}

/// Request body for returning a book; the date defaults to now when omitted
#[derive(Debug, Default, Deserialize)]
pub struct ReturnBookRequest {
    #[serde(rename = "returnDate")]
    pub return_date: Option<String>,
}

/// Response for a single ledger entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    pub book_id: String,
    pub member_id: String,
    pub issue_date: String,
    pub return_date: Option<String>,
    pub rent_fee: f64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<LoanTransaction> for TransactionResponse {
    fn from(t: LoanTransaction) -> Self {
        Self {
            id: t.id,
            book_id: t.book_id,
            member_id: t.member_id,
            issue_date: t.issue_date,
            return_date: t.return_date,
            rent_fee: t.rent_fee,
            status: t.status,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Salient book fields carried by ledger listings
#[derive(Debug, Serialize)]
pub struct BookSummary {
    pub title: String,
    pub authors: String,
}

/// Salient member fields carried by ledger listings
#[derive(Debug, Serialize)]
pub struct MemberSummary {
    pub name: String,
    pub email: String,
}

/// Ledger entry with the linked book and member denormalized for display
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecordResponse {
    #[serde(flatten)]
    pub transaction: TransactionResponse,
    pub book: BookSummary,
    pub member: MemberSummary,
}

impl From<LoanRecord> for TransactionRecordResponse {
    fn from(record: LoanRecord) -> Self {
        Self {
            transaction: record.transaction.into(),
            book: BookSummary {
                title: record.book_title,
                authors: record.book_authors,
            },
            member: MemberSummary {
                name: record.member_name,
                email: record.member_email,
            },
        }
    }
}

/// Response for a successful issue
#[derive(Debug, Serialize)]
pub struct IssueResponse {
    pub message: String,
    pub transaction: TransactionResponse,
}

/// Response for a successful return
#[derive(Debug, Serialize)]
pub struct ReturnResponse {
    pub message: String,
    pub transaction: TransactionResponse,
    #[serde(rename = "memberDebt")]
    pub member_debt: f64,
}

/// Ledger listing with its total count
#[derive(Debug, Serialize)]
pub struct TransactionsListResponse {
    pub total: usize,
    pub transactions: Vec<TransactionRecordResponse>,
}
