/// Notification model and database operations
///
/// Durable in-app notifications created by the lead lifecycle manager as a
/// side effect of lead state changes. Each notification belongs to exactly
/// one user; only that user may mark it read. Notifications are never
/// deleted by normal operation.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE notification_kind AS ENUM ('new_lead', 'lead_approved', 'lead_rejected');
///
/// CREATE TABLE notifications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     message TEXT NOT NULL,
///     kind notification_kind NOT NULL,
///     read BOOLEAN NOT NULL DEFAULT FALSE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     lead_id UUID REFERENCES leads(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// What lead event a notification reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A new lead is awaiting approval (sent to every admin)
    NewLead,

    /// The recipient's lead was approved
    LeadApproved,

    /// The recipient's lead was rejected
    LeadRejected,
}

impl sqlx::postgres::PgHasArrayType for NotificationKind {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("_notification_kind")
    }
}

impl NotificationKind {
    /// Converts kind to string for storage and real-time payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewLead => "new_lead",
            NotificationKind::LeadApproved => "lead_approved",
            NotificationKind::LeadRejected => "lead_rejected",
        }
    }
}

/// Notification model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,

    /// Short title shown in the notification list
    pub title: String,

    /// Full message body
    pub message: String,

    /// What happened
    pub kind: NotificationKind,

    /// Whether the owning user has read it
    pub read: bool,

    /// Recipient
    pub user_id: Uuid,

    /// Lead the notification refers to (null if the lead was deleted)
    pub lead_id: Option<Uuid>,

    /// When the notification was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    /// Short title
    pub title: String,

    /// Full message body
    pub message: String,

    /// What happened
    pub kind: NotificationKind,

    /// Recipient
    pub user_id: Uuid,

    /// Related lead, if any
    pub lead_id: Option<Uuid>,
}

impl Notification {
    /// Creates a single notification
    pub async fn create(pool: &PgPool, data: CreateNotification) -> Result<Self, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (title, message, kind, user_id, lead_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, message, kind, read, user_id, lead_id, created_at
            "#,
        )
        .bind(data.title)
        .bind(data.message)
        .bind(data.kind)
        .bind(data.user_id)
        .bind(data.lead_id)
        .fetch_one(pool)
        .await?;

        Ok(notification)
    }

    /// Bulk-creates notifications (admin fan-out on new lead submission)
    ///
    /// Returns the created rows in insertion order. An empty input returns
    /// an empty vec without touching the database.
    pub async fn create_many(
        pool: &PgPool,
        entries: Vec<CreateNotification>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut titles = Vec::with_capacity(entries.len());
        let mut messages = Vec::with_capacity(entries.len());
        let mut kinds = Vec::with_capacity(entries.len());
        let mut user_ids = Vec::with_capacity(entries.len());
        let mut lead_ids = Vec::with_capacity(entries.len());

        for entry in entries {
            titles.push(entry.title);
            messages.push(entry.message);
            kinds.push(entry.kind);
            user_ids.push(entry.user_id);
            lead_ids.push(entry.lead_id);
        }

        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (title, message, kind, user_id, lead_id)
            SELECT * FROM UNNEST($1::text[], $2::text[], $3::notification_kind[],
                                 $4::uuid[], $5::uuid[])
            RETURNING id, title, message, kind, read, user_id, lead_id, created_at
            "#,
        )
        .bind(titles)
        .bind(messages)
        .bind(kinds)
        .bind(user_ids)
        .bind(lead_ids)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }

    /// Lists a user's notifications, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, title, message, kind, read, user_id, lead_id, created_at
            FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }

    /// Counts a user's notifications matching the unread filter
    pub async fn count_for_user(
        pool: &PgPool,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications \
             WHERE user_id = $1 AND (NOT $2 OR read = FALSE)",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Marks one notification as read
    ///
    /// Scoped to the owning user; returns `None` if the notification does
    /// not exist or belongs to someone else.
    pub async fn mark_read(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING id, title, message, kind, read, user_id, lead_id, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(notification)
    }

    /// Marks all of a user's notifications as read, returning how many changed
    pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE")
                .bind(user_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_as_str() {
        assert_eq!(NotificationKind::NewLead.as_str(), "new_lead");
        assert_eq!(NotificationKind::LeadApproved.as_str(), "lead_approved");
        assert_eq!(NotificationKind::LeadRejected.as_str(), "lead_rejected");
    }

    #[test]
    fn test_kind_serde_wire_form() {
        let json = serde_json::to_string(&NotificationKind::LeadApproved).unwrap();
        assert_eq!(json, "\"lead_approved\"");

        let kind: NotificationKind = serde_json::from_str("\"new_lead\"").unwrap();
        assert_eq!(kind, NotificationKind::NewLead);
    }
}
