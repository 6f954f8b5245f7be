/// Lead model and database operations
///
/// This module provides the Lead model representing candidate contact records
/// submitted for administrative approval. Leads are the core entity of the
/// LeadFlow system.
///
/// # State Machine
///
/// ```text
/// pending → approved
///         → rejected
/// ```
///
/// A lead leaves `pending` at most once. Both `approved` and `rejected` are
/// terminal; there is no re-approval and no un-rejecting. The transition is
/// applied as a conditional update (`WHERE status = 'pending'`) so that two
/// concurrent decisions on the same lead cannot both succeed.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE lead_status AS ENUM ('pending', 'approved', 'rejected');
///
/// CREATE TABLE leads (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     first_name VARCHAR(100) NOT NULL,
///     last_name VARCHAR(100) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     phone VARCHAR(50),
///     company VARCHAR(255) NOT NULL,
///     position VARCHAR(255),
///     description TEXT,
///     status lead_status NOT NULL DEFAULT 'pending',
///     submitted_by_id UUID NOT NULL REFERENCES users(id),
///     approved_by_id UUID REFERENCES users(id),
///     remote_crm_id VARCHAR(64),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use leadflow_shared::models::lead::{CreateLead, Lead, LeadStatus, LeadDecision};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, submitter: Uuid, admin: Uuid) -> Result<(), sqlx::Error> {
/// let lead = Lead::create(&pool, CreateLead {
///     first_name: "Ana".to_string(),
///     last_name: "Ruiz".to_string(),
///     email: "ana@example.com".to_string(),
///     phone: None,
///     company: "Acme".to_string(),
///     position: None,
///     description: None,
///     submitted_by_id: submitter,
/// }).await?;
///
/// // Approve it (conditional on still being pending)
/// let approved = Lead::update_status(
///     &pool,
///     lead.id,
///     LeadStatus::Pending,
///     LeadDecision::approve(admin, Some("00Q5g00000ABCDE".to_string())),
/// ).await?;
/// assert!(approved.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Lead approval status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lead_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    /// Submitted, awaiting an administrator's decision
    Pending,

    /// Approved by an administrator (terminal)
    Approved,

    /// Rejected by an administrator (terminal)
    Rejected,
}

impl LeadStatus {
    /// Converts status to string for database storage and API responses
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Pending => "pending",
            LeadStatus::Approved => "approved",
            LeadStatus::Rejected => "rejected",
        }
    }

    /// Checks if status is terminal (a decision has been made)
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Approved | LeadStatus::Rejected)
    }

    /// Checks if transition to target status is valid
    ///
    /// Only a pending lead can move, and only to a terminal decision.
    pub fn can_transition_to(&self, target: LeadStatus) -> bool {
        *self == LeadStatus::Pending && target.is_terminal()
    }

    /// Parses a status from its lowercase wire form
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(LeadStatus::Pending),
            "approved" => Some(LeadStatus::Approved),
            "rejected" => Some(LeadStatus::Rejected),
            _ => None,
        }
    }
}

/// Lead model representing a submitted candidate record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lead {
    /// Unique lead ID
    pub id: Uuid,

    /// Contact first name
    pub first_name: String,

    /// Contact last name
    pub last_name: String,

    /// Contact email address
    pub email: String,

    /// Optional contact phone number
    pub phone: Option<String>,

    /// Company the contact belongs to
    pub company: String,

    /// Optional job title
    pub position: Option<String>,

    /// Free-form description; rejection reasons are appended here
    pub description: Option<String>,

    /// Current approval status
    pub status: LeadStatus,

    /// User who submitted the lead (the seeded anonymous user for guests)
    pub submitted_by_id: Uuid,

    /// Administrator who decided the lead (null while pending)
    pub approved_by_id: Option<Uuid>,

    /// Identifier assigned by the external CRM (null if sync failed or
    /// the lead was never approved)
    pub remote_crm_id: Option<String>,

    /// When the lead was submitted
    pub created_at: DateTime<Utc>,

    /// When the lead was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new lead
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLead {
    /// Contact first name (required)
    pub first_name: String,

    /// Contact last name (required)
    pub last_name: String,

    /// Contact email (required, syntactically valid)
    pub email: String,

    /// Optional phone number
    pub phone: Option<String>,

    /// Company (required)
    pub company: String,

    /// Optional job title
    pub position: Option<String>,

    /// Optional description
    pub description: Option<String>,

    /// Submitting user
    pub submitted_by_id: Uuid,
}

/// Patch applied by an administrator's decision
///
/// Applied atomically with the `WHERE status = 'pending'` guard via
/// [`Lead::update_status`]. `None` fields keep the stored value.
#[derive(Debug, Clone)]
pub struct LeadDecision {
    /// Target status (approved or rejected)
    pub status: LeadStatus,

    /// Administrator who made the decision
    pub decided_by: Uuid,

    /// CRM record ID captured during approval, if sync succeeded
    pub remote_crm_id: Option<String>,

    /// Replacement description (used to append a rejection reason)
    pub description: Option<String>,
}

impl LeadDecision {
    /// Builds an approval patch
    pub fn approve(admin_id: Uuid, remote_crm_id: Option<String>) -> Self {
        Self {
            status: LeadStatus::Approved,
            decided_by: admin_id,
            remote_crm_id,
            description: None,
        }
    }

    /// Builds a rejection patch
    pub fn reject(admin_id: Uuid, description: Option<String>) -> Self {
        Self {
            status: LeadStatus::Rejected,
            decided_by: admin_id,
            remote_crm_id: None,
            description,
        }
    }
}

/// Per-status lead counts for dashboards
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LeadCounts {
    /// Leads awaiting a decision
    pub pending: i64,

    /// Approved leads
    pub approved: i64,

    /// Rejected leads
    pub rejected: i64,

    /// All leads matching the filter
    pub total: i64,
}

const LEAD_COLUMNS: &str = "id, first_name, last_name, email, phone, company, position, \
     description, status, submitted_by_id, approved_by_id, remote_crm_id, \
     created_at, updated_at";

impl Lead {
    /// Creates a new lead in pending status
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails, including when
    /// `submitted_by_id` does not reference an existing user.
    pub async fn create(pool: &PgPool, data: CreateLead) -> Result<Self, sqlx::Error> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (first_name, last_name, email, phone, company,
                               position, description, submitted_by_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, first_name, last_name, email, phone, company, position,
                      description, status, submitted_by_id, approved_by_id,
                      remote_crm_id, created_at, updated_at
            "#,
        )
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .bind(data.phone)
        .bind(data.company)
        .bind(data.position)
        .bind(data.description)
        .bind(data.submitted_by_id)
        .fetch_one(pool)
        .await?;

        Ok(lead)
    }

    /// Finds a lead by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            SELECT id, first_name, last_name, email, phone, company, position,
                   description, status, submitted_by_id, approved_by_id,
                   remote_crm_id, created_at, updated_at
            FROM leads
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(lead)
    }

    /// Applies an administrator's decision as a conditional update
    ///
    /// The update only takes effect if the lead's current status equals
    /// `expected`. Returns `None` when the guard misses, i.e. the lead was
    /// already decided by a concurrent request (or does not exist). The
    /// caller must treat `None` as "state already changed", not overwrite.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        expected: LeadStatus,
        patch: LeadDecision,
    ) -> Result<Option<Self>, sqlx::Error> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads
            SET status = $3,
                approved_by_id = $4,
                remote_crm_id = COALESCE($5, remote_crm_id),
                description = COALESCE($6, description),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING id, first_name, last_name, email, phone, company, position,
                      description, status, submitted_by_id, approved_by_id,
                      remote_crm_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(patch.status)
        .bind(patch.decided_by)
        .bind(patch.remote_crm_id)
        .bind(patch.description)
        .fetch_optional(pool)
        .await?;

        Ok(lead)
    }

    /// Lists leads, optionally filtered by status, newest first
    pub async fn list(
        pool: &PgPool,
        status: Option<LeadStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {LEAD_COLUMNS} FROM leads \
             WHERE ($1::lead_status IS NULL OR status = $1) \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );

        let leads = sqlx::query_as::<_, Lead>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(leads)
    }

    /// Lists all pending leads, newest first
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE status = 'pending' \
             ORDER BY created_at DESC"
        );

        let leads = sqlx::query_as::<_, Lead>(&query).fetch_all(pool).await?;

        Ok(leads)
    }

    /// Counts leads, optionally filtered by status
    pub async fn count(pool: &PgPool, status: Option<LeadStatus>) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM leads WHERE ($1::lead_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Counts leads grouped by status, optionally scoped to one submitter
    pub async fn count_by_status(
        pool: &PgPool,
        submitted_by: Option<Uuid>,
    ) -> Result<LeadCounts, sqlx::Error> {
        let row: (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE status = 'pending'),
                   COUNT(*) FILTER (WHERE status = 'approved'),
                   COUNT(*) FILTER (WHERE status = 'rejected'),
                   COUNT(*)
            FROM leads
            WHERE ($1::uuid IS NULL OR submitted_by_id = $1)
            "#,
        )
        .bind(submitted_by)
        .fetch_one(pool)
        .await?;

        Ok(LeadCounts {
            pending: row.0,
            approved: row.1,
            rejected: row.2,
            total: row.3,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_status_as_str() {
        assert_eq!(LeadStatus::Pending.as_str(), "pending");
        assert_eq!(LeadStatus::Approved.as_str(), "approved");
        assert_eq!(LeadStatus::Rejected.as_str(), "rejected");
    }

    #[test]
    fn test_lead_status_parse() {
        assert_eq!(LeadStatus::parse("pending"), Some(LeadStatus::Pending));
        assert_eq!(LeadStatus::parse("approved"), Some(LeadStatus::Approved));
        assert_eq!(LeadStatus::parse("rejected"), Some(LeadStatus::Rejected));
        assert_eq!(LeadStatus::parse("PENDING"), None);
        assert_eq!(LeadStatus::parse("open"), None);
    }

    #[test]
    fn test_lead_status_is_terminal() {
        assert!(!LeadStatus::Pending.is_terminal());
        assert!(LeadStatus::Approved.is_terminal());
        assert!(LeadStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_lead_status_transitions() {
        assert!(LeadStatus::Pending.can_transition_to(LeadStatus::Approved));
        assert!(LeadStatus::Pending.can_transition_to(LeadStatus::Rejected));

        // No self-transition
        assert!(!LeadStatus::Pending.can_transition_to(LeadStatus::Pending));

        // Terminal states never move, not even sideways
        assert!(!LeadStatus::Approved.can_transition_to(LeadStatus::Rejected));
        assert!(!LeadStatus::Approved.can_transition_to(LeadStatus::Pending));
        assert!(!LeadStatus::Rejected.can_transition_to(LeadStatus::Approved));
        assert!(!LeadStatus::Rejected.can_transition_to(LeadStatus::Pending));
    }

    #[test]
    fn test_decision_builders() {
        let admin = Uuid::new_v4();

        let approve = LeadDecision::approve(admin, Some("00Q1".to_string()));
        assert_eq!(approve.status, LeadStatus::Approved);
        assert_eq!(approve.decided_by, admin);
        assert_eq!(approve.remote_crm_id.as_deref(), Some("00Q1"));
        assert!(approve.description.is_none());

        let reject = LeadDecision::reject(admin, Some("duplicate".to_string()));
        assert_eq!(reject.status, LeadStatus::Rejected);
        assert!(reject.remote_crm_id.is_none());
        assert_eq!(reject.description.as_deref(), Some("duplicate"));
    }
}
