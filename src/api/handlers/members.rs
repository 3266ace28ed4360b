use super::AppState;
use crate::api::models::{
    page_count, CreateMemberRequest, MemberEnvelope, MemberMessageResponse, MemberResponse,
    MemberSearchResponse, MembersListResponse, PageQuery, SearchQuery,
};
use crate::core::error::{LibraryError, Result};
use crate::db::models::Member;
use crate::db::repository::Repository;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

/// Handler for POST /api/members - Register a new member
pub async fn create_member(
    State(state): State<AppState>,
    Json(req): Json<CreateMemberRequest>,
) -> Result<impl IntoResponse> {
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    let (name, email) = match (name, email) {
        (Some(n), Some(e)) => (n.to_string(), e.to_lowercase()),
        _ => {
            return Err(LibraryError::ValidationError(
                "Name and Email are required.".to_string(),
            ))
        }
    };

    if state.member_repo.find_by_email(&email).await?.is_some() {
        return Err(LibraryError::Conflict(
            "Member with this email already exists.".to_string(),
        ));
    }

    let now = Utc::now().to_rfc3339();
    let member = Member {
        id: Uuid::new_v4().to_string(),
        name,
        email,
        phone: req.phone.map(|p| p.trim().to_string()).unwrap_or_default(),
        outstanding_debt: 0.0,
        created_at: now.clone(),
        updated_at: now,
    };

    state.member_repo.create(&member).await?;

    Ok((
        StatusCode::CREATED,
        Json(MemberMessageResponse {
            message: "Member added successfully.".to_string(),
            member: MemberResponse::from(member),
        }),
    ))
}

/// Handler for GET /api/members - List members, newest first, paginated
pub async fn list_members(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let (page, limit) = params.normalized();
    let (members, total) = state.member_repo.list_paginated(page, limit).await?;

    Ok(Json(MembersListResponse {
        page,
        limit,
        total,
        pages: page_count(total, limit),
        members: members.into_iter().map(MemberResponse::from).collect(),
    }))
}

/// Handler for GET /api/members/:id - Get member by ID
pub async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let member = state
        .member_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| LibraryError::NotFound("Member not found.".to_string()))?;

    Ok(Json(MemberEnvelope {
        member: MemberResponse::from(member),
    }))
}

/// Handler for DELETE /api/members/:id - Remove a member
pub async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let member = state
        .member_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| LibraryError::NotFound("Member not found.".to_string()))?;

    state.member_repo.delete(&member.id).await?;

    Ok(Json(MemberMessageResponse {
        message: "Member deleted successfully.".to_string(),
        member: MemberResponse::from(member),
    }))
}

/// Handler for GET /api/members/search?q= - Substring search over name/email
pub async fn search_members(
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
    let (members, total) = state.member_repo.search(&q, page, limit).await?;

    Ok(Json(MemberSearchResponse {
        q,
        page,
        limit,
        total,
        pages: page_count(total, limit),
        results: members.into_iter().map(MemberResponse::from).collect(),
    }))
}
