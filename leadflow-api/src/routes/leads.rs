/// Lead workflow endpoints
///
/// - `POST /v1/leads` - Submit a lead (public; authenticated submitters are
///   attributed, guests fall back to the seeded anonymous user)
/// - `GET  /v1/leads/pending` - All pending leads (admin)
/// - `GET  /v1/leads?status=&page=&limit=` - Paginated listing (admin)
/// - `GET  /v1/leads/stats` - Counts by status (own leads, or all for admins)
/// - `POST /v1/leads/:id/approve` - Approve a pending lead (admin)
/// - `POST /v1/leads/:id/reject` - Reject a pending lead (admin)
/// - `GET  /v1/leads/crm/test` - CRM connectivity check (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    lifecycle::{CrmHealth, SubmitLead},
};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use leadflow_shared::{
    auth::middleware::{authenticate, authenticate_optional},
    models::{
        lead::{Lead, LeadCounts, LeadStatus},
        user::{UserRole, ANONYMOUS_USER_ID},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Submission response: id and status only
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// Confirmation message
    pub message: String,

    /// Created lead ID
    pub id: Uuid,

    /// Always "pending"
    pub status: LeadStatus,
}

/// Listing query parameters
#[derive(Debug, Deserialize)]
pub struct ListLeadsQuery {
    /// Optional status filter ("pending", "approved", "rejected")
    pub status: Option<String>,

    /// 1-based page number (default 1)
    pub page: Option<u32>,

    /// Page size (default 10, max 100)
    pub limit: Option<u32>,
}

/// Pagination metadata
#[derive(Debug, Serialize)]
pub struct Pagination {
    /// Current 1-based page
    pub current_page: u32,

    /// Total number of pages
    pub total_pages: i64,

    /// Total matching leads
    pub total_items: i64,

    /// Page size
    pub items_per_page: u32,
}

/// Paginated listing response
#[derive(Debug, Serialize)]
pub struct ListLeadsResponse {
    /// Leads on this page, newest first
    pub leads: Vec<Lead>,

    /// Pagination metadata
    pub pagination: Pagination,
}

/// Rejection request body
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Optional reason, appended to the lead description and included in
    /// the submitter's notification
    pub reason: Option<String>,
}

/// Approval response
#[derive(Debug, Serialize)]
pub struct ApproveResponse {
    /// Confirmation message
    pub message: String,

    /// The updated lead
    pub lead: Lead,

    /// Whether the CRM mirror succeeded
    pub crm_synced: bool,
}

/// Rejection response
#[derive(Debug, Serialize)]
pub struct RejectResponse {
    /// Confirmation message
    pub message: String,

    /// The updated lead
    pub lead: Lead,
}

/// Submits a new lead (public endpoint)
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SubmitLead>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    // Authenticated submitters are attributed; guests use the seeded
    // anonymous user so the foreign key always holds.
    let submitter_id = authenticate_optional(&headers, state.jwt_secret())?
        .map(|ctx| ctx.user_id)
        .unwrap_or(ANONYMOUS_USER_ID);

    let submitted = state.lifecycle.submit(request, submitter_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            message: "Lead submitted and pending approval".to_string(),
            id: submitted.id,
            status: submitted.status,
        }),
    ))
}

/// Lists all pending leads (admin)
pub async fn list_pending(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Lead>>> {
    let auth = authenticate(&headers, state.jwt_secret())?;
    auth.require_admin()?;

    let leads = state.lifecycle.list_pending().await?;

    Ok(Json(leads))
}

/// Lists leads with optional status filter and pagination (admin)
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListLeadsQuery>,
) -> ApiResult<Json<ListLeadsResponse>> {
    let auth = authenticate(&headers, state.jwt_secret())?;
    auth.require_admin()?;

    let status = match query.status.as_deref() {
        Some(raw) => Some(
            LeadStatus::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown status '{raw}'")))?,
        ),
        None => None,
    };

    let page = state
        .lifecycle
        .list_by_status(status, query.page.unwrap_or(1), query.limit.unwrap_or(10))
        .await?;

    let total_pages = (page.total + i64::from(page.page_size) - 1) / i64::from(page.page_size);

    Ok(Json(ListLeadsResponse {
        pagination: Pagination {
            current_page: page.page,
            total_pages,
            total_items: page.total,
            items_per_page: page.page_size,
        },
        leads: page.leads,
    }))
}

/// Lead counts by status for dashboards
///
/// Administrators see counts over all leads; regular users only over what
/// they submitted.
pub async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<LeadCounts>> {
    let auth = authenticate(&headers, state.jwt_secret())?;

    let submitted_by = match auth.role {
        UserRole::Admin => None,
        UserRole::User => Some(auth.user_id),
    };

    let counts = state.lifecycle.count_by_status(submitted_by).await?;

    Ok(Json(counts))
}

/// Approves a pending lead (admin)
pub async fn approve(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(lead_id): Path<Uuid>,
) -> ApiResult<Json<ApproveResponse>> {
    let auth = authenticate(&headers, state.jwt_secret())?;
    auth.require_admin()?;

    let outcome = state.lifecycle.approve(lead_id, auth.user_id).await?;

    let message = if outcome.crm_synced {
        "Lead approved and sent to the CRM".to_string()
    } else {
        "Lead approved; CRM sync failed and will need manual attention".to_string()
    };

    Ok(Json(ApproveResponse {
        message,
        lead: outcome.lead,
        crm_synced: outcome.crm_synced,
    }))
}

/// Rejects a pending lead (admin)
pub async fn reject(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(lead_id): Path<Uuid>,
    Json(request): Json<RejectRequest>,
) -> ApiResult<Json<RejectResponse>> {
    let auth = authenticate(&headers, state.jwt_secret())?;
    auth.require_admin()?;

    let lead = state
        .lifecycle
        .reject(lead_id, auth.user_id, request.reason)
        .await?;

    Ok(Json(RejectResponse {
        message: "Lead rejected".to_string(),
        lead,
    }))
}

/// CRM connectivity check (admin); never fails, always reports
pub async fn test_crm(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<CrmHealth>> {
    let auth = authenticate(&headers, state.jwt_secret())?;
    auth.require_admin()?;

    Ok(Json(state.lifecycle.test_crm_connection().await))
}
