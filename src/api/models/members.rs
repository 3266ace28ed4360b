use crate::db::models::Member;
use serde::{Deserialize, Serialize};

// Member API models

/// Request body for registering a new member
#[derive(Debug, Deserialize)]
pub struct CreateMemberRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Response for member operations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub outstanding_debt: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            name: member.name,
            email: member.email,
            phone: member.phone,
            outstanding_debt: member.outstanding_debt,
            created_at: member.created_at,
            updated_at: member.updated_at,
        }
    }
}

/// Envelope for create/delete responses
#[derive(Debug, Serialize)]
pub struct MemberMessageResponse {
    pub message: String,
    pub member: MemberResponse,
}

/// Envelope for a single fetched member
#[derive(Debug, Serialize)]
pub struct MemberEnvelope {
    pub member: MemberResponse,
}

/// Paginated member listing
#[derive(Debug, Serialize)]
pub struct MembersListResponse {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub pages: u32,
    pub members: Vec<MemberResponse>,
}

/// Paginated search results, echoing the query
#[derive(Debug, Serialize)]
pub struct MemberSearchResponse {
    pub q: String,
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    pub pages: u32,
    pub results: Vec<MemberResponse>,
}
