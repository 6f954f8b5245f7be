/// Notification feed endpoints
///
/// - `GET /v1/notifications?page=&limit=&unread_only=` - Own notifications
/// - `PUT /v1/notifications/:id/read` - Mark one as read
/// - `PUT /v1/notifications/read-all` - Mark all as read
///
/// All endpoints are scoped to the authenticated user; a notification can
/// only be read (or marked) by its owner.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use leadflow_shared::{auth::middleware::authenticate, models::notification::Notification};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Feed query parameters
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    /// 1-based page number (default 1)
    pub page: Option<u32>,

    /// Page size (default 10, max 100)
    pub limit: Option<u32>,

    /// Only unread notifications (default false)
    pub unread_only: Option<bool>,
}

/// Pagination metadata
#[derive(Debug, Serialize)]
pub struct Pagination {
    /// Current 1-based page
    pub current_page: u32,

    /// Total number of pages
    pub total_pages: i64,

    /// Total matching notifications
    pub total_items: i64,

    /// Page size
    pub items_per_page: u32,
}

/// Feed response
#[derive(Debug, Serialize)]
pub struct ListNotificationsResponse {
    /// Notifications on this page, newest first
    pub notifications: Vec<Notification>,

    /// Pagination metadata
    pub pagination: Pagination,

    /// Unread count regardless of the filter, for badge display
    pub unread_count: i64,
}

/// Response after marking all read
#[derive(Debug, Serialize)]
pub struct ReadAllResponse {
    /// How many notifications changed
    pub marked_read: u64,
}

/// Lists the authenticated user's notifications
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListNotificationsQuery>,
) -> ApiResult<Json<ListNotificationsResponse>> {
    let auth = authenticate(&headers, state.jwt_secret())?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let unread_only = query.unread_only.unwrap_or(false);
    let offset = i64::from(page - 1) * i64::from(limit);

    let notifications = Notification::list_for_user(
        &state.db,
        auth.user_id,
        unread_only,
        i64::from(limit),
        offset,
    )
    .await?;
    let total = Notification::count_for_user(&state.db, auth.user_id, unread_only).await?;
    let unread_count = Notification::count_for_user(&state.db, auth.user_id, true).await?;

    let total_pages = (total + i64::from(limit) - 1) / i64::from(limit);

    Ok(Json(ListNotificationsResponse {
        notifications,
        pagination: Pagination {
            current_page: page,
            total_pages,
            total_items: total,
            items_per_page: limit,
        },
        unread_count,
    }))
}

/// Marks one of the user's notifications as read
pub async fn mark_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<Json<Notification>> {
    let auth = authenticate(&headers, state.jwt_secret())?;

    let notification = Notification::mark_read(&state.db, notification_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(Json(notification))
}

/// Marks all of the user's notifications as read
pub async fn mark_all_read(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ReadAllResponse>> {
    let auth = authenticate(&headers, state.jwt_secret())?;

    let marked_read = Notification::mark_all_read(&state.db, auth.user_id).await?;

    Ok(Json(ReadAllResponse { marked_read }))
}
