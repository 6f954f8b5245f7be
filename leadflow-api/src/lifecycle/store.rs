/// Storage seams for the lifecycle manager
///
/// The manager depends on these traits rather than on sqlx directly, so the
/// state machine can be exercised against in-memory fakes in tests and the
/// persistence engine stays swappable. The production implementations
/// (`Pg*`) delegate to the model methods in `leadflow-shared`.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use leadflow_shared::models::{
    lead::{CreateLead, Lead, LeadCounts, LeadDecision, LeadStatus},
    notification::{CreateNotification, Notification},
    user::User,
};

/// Storage errors surfaced by the seams
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Backend-specific failure (used by non-SQL implementations)
    #[error("Storage error: {0}")]
    Backend(String),
}

/// Lead persistence contract
///
/// `update_status` is the conditional update at the heart of the state
/// machine: it applies the patch only where the current status matches
/// `expected`, and returns `None` when the guard misses.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Persists a new pending lead
    async fn create(&self, data: CreateLead) -> Result<Lead, StoreError>;

    /// Fetches a lead by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, StoreError>;

    /// Conditionally applies an admin decision
    async fn update_status(
        &self,
        id: Uuid,
        expected: LeadStatus,
        patch: LeadDecision,
    ) -> Result<Option<Lead>, StoreError>;

    /// Lists leads filtered by status, newest first
    async fn list(
        &self,
        status: Option<LeadStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Lead>, StoreError>;

    /// Lists all pending leads, newest first
    async fn list_pending(&self) -> Result<Vec<Lead>, StoreError>;

    /// Counts leads matching the status filter
    async fn count(&self, status: Option<LeadStatus>) -> Result<i64, StoreError>;

    /// Counts leads grouped by status, optionally per submitter
    async fn count_by_status(&self, submitted_by: Option<Uuid>) -> Result<LeadCounts, StoreError>;
}

/// Durable notification contract
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Creates one notification
    async fn create(&self, entry: CreateNotification) -> Result<Notification, StoreError>;

    /// Bulk-creates notifications (admin fan-out)
    async fn create_many(
        &self,
        entries: Vec<CreateNotification>,
    ) -> Result<Vec<Notification>, StoreError>;
}

/// Administrator directory contract
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// Lists every administrator account
    async fn list_admins(&self) -> Result<Vec<User>, StoreError>;
}

/// Postgres-backed lead store
pub struct PgLeadStore {
    pool: PgPool,
}

impl PgLeadStore {
    /// Wraps a connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn create(&self, data: CreateLead) -> Result<Lead, StoreError> {
        Ok(Lead::create(&self.pool, data).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, StoreError> {
        Ok(Lead::find_by_id(&self.pool, id).await?)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: LeadStatus,
        patch: LeadDecision,
    ) -> Result<Option<Lead>, StoreError> {
        Ok(Lead::update_status(&self.pool, id, expected, patch).await?)
    }

    async fn list(
        &self,
        status: Option<LeadStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Lead>, StoreError> {
        Ok(Lead::list(&self.pool, status, limit, offset).await?)
    }

    async fn list_pending(&self) -> Result<Vec<Lead>, StoreError> {
        Ok(Lead::list_pending(&self.pool).await?)
    }

    async fn count(&self, status: Option<LeadStatus>) -> Result<i64, StoreError> {
        Ok(Lead::count(&self.pool, status).await?)
    }

    async fn count_by_status(&self, submitted_by: Option<Uuid>) -> Result<LeadCounts, StoreError> {
        Ok(Lead::count_by_status(&self.pool, submitted_by).await?)
    }
}

/// Postgres-backed notification sink
pub struct PgNotificationSink {
    pool: PgPool,
}

impl PgNotificationSink {
    /// Wraps a connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for PgNotificationSink {
    async fn create(&self, entry: CreateNotification) -> Result<Notification, StoreError> {
        Ok(Notification::create(&self.pool, entry).await?)
    }

    async fn create_many(
        &self,
        entries: Vec<CreateNotification>,
    ) -> Result<Vec<Notification>, StoreError> {
        Ok(Notification::create_many(&self.pool, entries).await?)
    }
}

/// Postgres-backed administrator directory
pub struct PgAdminDirectory {
    pool: PgPool,
}

impl PgAdminDirectory {
    /// Wraps a connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminDirectory for PgAdminDirectory {
    async fn list_admins(&self) -> Result<Vec<User>, StoreError> {
        Ok(User::list_admins(&self.pool).await?)
    }
}
