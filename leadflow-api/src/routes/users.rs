/// User account endpoints
///
/// - `GET /v1/users/profile` - The authenticated user's own profile
/// - `GET /v1/users?role=&page=&limit=` - User directory with per-user lead
///   activity (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use leadflow_shared::{
    auth::middleware::authenticate,
    models::user::{User, UserRole, UserSummary},
};
use serde::{Deserialize, Serialize};

/// Directory query parameters
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// Optional role filter ("user", "admin")
    pub role: Option<String>,

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

    /// Total matching users
    pub total_items: i64,

    /// Page size
    pub items_per_page: u32,
}

/// Directory response
#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    /// Users on this page, newest accounts first
    pub users: Vec<UserSummary>,

    /// Pagination metadata
    pub pagination: Pagination,
}

/// Returns the authenticated user's own profile
pub async fn profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<User>> {
    let auth = authenticate(&headers, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Lists user accounts with their lead activity (admin)
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<ListUsersResponse>> {
    let auth = authenticate(&headers, state.jwt_secret())?;
    auth.require_admin()?;

    let role = match query.role.as_deref() {
        Some(raw) => Some(
            UserRole::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown role '{raw}'")))?,
        ),
        None => None,
    };

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let offset = i64::from(page - 1) * i64::from(limit);

    let users =
        User::list_with_lead_counts(&state.db, role, i64::from(limit), offset).await?;
    let total = User::count(&state.db, role).await?;

    let total_pages = (total + i64::from(limit) - 1) / i64::from(limit);

    Ok(Json(ListUsersResponse {
        users,
        pagination: Pagination {
            current_page: page,
            total_pages,
            total_items: total,
            items_per_page: limit,
        },
    }))
}
