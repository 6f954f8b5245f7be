/// Lead lifecycle manager
///
/// The orchestration core of LeadFlow: enforces the lead state machine
/// (pending → approved / rejected, one transition ever) and coordinates the
/// surrounding sinks in a defined order with defined failure tolerance.
///
/// # Control flow
///
/// ```text
/// submit ──> validate ──> persist pending lead ──> notify admins (durable)
///                                             └──> publish events (best-effort)
///
/// approve ──> load + pending check ──> CRM sync (tolerated failure)
///         ──> conditional update (WHERE status = 'pending')
///         ──> notify submitter (durable + best-effort event)
///
/// reject ──> load + pending check ──> conditional update (appends reason)
///        ──> notify submitter (durable + best-effort event)
/// ```
///
/// # Failure policy
///
/// The local repository write is the source of truth. Once the conditional
/// update commits, the operation succeeds from the caller's perspective:
/// CRM failures are recorded as `crm_synced = false`, and notification or
/// publish failures are logged and swallowed. Nothing is ever rolled back
/// because a downstream sink failed.

pub mod store;
pub mod validate;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::crm::{CrmConnector, CrmIdentity};
use crate::publish::EventPublisher;
use leadflow_shared::events::{user_channel, LeadEvent, LeadEventKind};
use leadflow_shared::models::{
    lead::{CreateLead, Lead, LeadCounts, LeadDecision, LeadStatus},
    notification::{CreateNotification, NotificationKind},
};

use store::{
    AdminDirectory, LeadStore, NotificationSink, PgAdminDirectory, PgLeadStore, PgNotificationSink,
    StoreError,
};
use validate::{validate_submission, FieldError};

/// Separator placed between the original description and a rejection reason
const REJECTION_SEPARATOR: &str = "\n\nRejection reason: ";

/// Errors surfaced by lifecycle operations
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Submission failed validation; carries every offending field
    #[error("Validation failed: {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Referenced lead does not exist
    #[error("Lead {0} not found")]
    NotFound(Uuid),

    /// Lead exists but is no longer pending
    #[error("Lead {0} was already processed")]
    InvalidState(Uuid),

    /// Storage failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Lead submission input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitLead {
    /// Contact first name (required)
    pub first_name: String,

    /// Contact last name (required)
    pub last_name: String,

    /// Contact email (required)
    pub email: String,

    /// Optional phone number
    pub phone: Option<String>,

    /// Company (required)
    pub company: String,

    /// Optional job title
    pub position: Option<String>,

    /// Optional description
    pub description: Option<String>,
}

/// Result of a submission: callers only need the ID and status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedLead {
    /// Created lead ID
    pub id: Uuid,

    /// Always pending on creation
    pub status: LeadStatus,
}

/// Result of an approval
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    /// The updated lead
    pub lead: Lead,

    /// Whether the CRM mirror succeeded; false leaves `remote_crm_id` null
    pub crm_synced: bool,
}

/// One page of leads with an accurate total
#[derive(Debug, Clone, Serialize)]
pub struct LeadPage {
    /// Leads on this page, newest first
    pub leads: Vec<Lead>,

    /// 1-based page number
    pub page: u32,

    /// Page size used for the query
    pub page_size: u32,

    /// Total leads matching the filter
    pub total: i64,
}

/// CRM health report; never an error from the caller's perspective
#[derive(Debug, Clone, Serialize)]
pub struct CrmHealth {
    /// Whether the CRM answered the health check
    pub success: bool,

    /// Integration identity when reachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<CrmIdentity>,

    /// Failure detail when unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The lifecycle manager
///
/// One instance serves the whole process; all collaborator backends are
/// injected, so tests can swap in fakes and deployments select real
/// backends by configuration.
pub struct LifecycleManager {
    leads: Arc<dyn LeadStore>,
    notifications: Arc<dyn NotificationSink>,
    admins: Arc<dyn AdminDirectory>,
    crm: Arc<dyn CrmConnector>,
    publisher: Arc<dyn EventPublisher>,
}

impl LifecycleManager {
    /// Builds a manager from explicit backends
    pub fn new(
        leads: Arc<dyn LeadStore>,
        notifications: Arc<dyn NotificationSink>,
        admins: Arc<dyn AdminDirectory>,
        crm: Arc<dyn CrmConnector>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            leads,
            notifications,
            admins,
            crm,
            publisher,
        }
    }

    /// Builds a manager with Postgres storage backends
    pub fn postgres(
        pool: PgPool,
        crm: Arc<dyn CrmConnector>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self::new(
            Arc::new(PgLeadStore::new(pool.clone())),
            Arc::new(PgNotificationSink::new(pool.clone())),
            Arc::new(PgAdminDirectory::new(pool)),
            crm,
            publisher,
        )
    }

    /// Submits a new lead
    ///
    /// Validates, persists the pending lead, then fans out to admins. The
    /// persist must succeed before any side effect runs; fan-out failures
    /// are logged and swallowed so a submission never fails because a
    /// notification could not be written.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::Validation`] listing every offending field
    /// - [`LifecycleError::Store`] if the lead itself cannot be persisted
    pub async fn submit(
        &self,
        data: SubmitLead,
        submitter_id: Uuid,
    ) -> Result<SubmittedLead, LifecycleError> {
        validate_submission(&data).map_err(LifecycleError::Validation)?;

        let lead = self
            .leads
            .create(CreateLead {
                first_name: data.first_name,
                last_name: data.last_name,
                email: data.email,
                phone: data.phone,
                company: data.company,
                position: data.position,
                description: data.description,
                submitted_by_id: submitter_id,
            })
            .await?;

        info!(lead_id = %lead.id, submitter = %submitter_id, "Lead submitted");

        if let Err(e) = self.notify_admins(&lead).await {
            warn!(lead_id = %lead.id, error = %e, "Admin notification fan-out failed");
        }

        Ok(SubmittedLead {
            id: lead.id,
            status: lead.status,
        })
    }

    /// Approves a pending lead
    ///
    /// Attempts the CRM mirror first; a CRM failure never blocks the local
    /// approval and is reported as `crm_synced = false`. The status change
    /// itself is a conditional update, so of two concurrent decisions
    /// exactly one wins and the other observes
    /// [`LifecycleError::InvalidState`].
    pub async fn approve(
        &self,
        lead_id: Uuid,
        admin_id: Uuid,
    ) -> Result<ApprovalOutcome, LifecycleError> {
        let lead = self.load_for_decision(lead_id, LeadStatus::Approved).await?;

        let remote_id = match self.crm.create_remote_record(&lead).await {
            Ok(record) => Some(record.id),
            Err(e) => {
                warn!(lead_id = %lead_id, error = %e, "CRM sync failed, approving locally");
                None
            }
        };
        let crm_synced = remote_id.is_some();

        let updated = self
            .leads
            .update_status(
                lead_id,
                LeadStatus::Pending,
                LeadDecision::approve(admin_id, remote_id),
            )
            .await?
            .ok_or(LifecycleError::InvalidState(lead_id))?;

        info!(
            lead_id = %lead_id,
            admin = %admin_id,
            crm_synced,
            "Lead approved"
        );

        let message = if crm_synced {
            format!(
                "Your lead for {} was approved and sent to the CRM",
                updated.company
            )
        } else {
            format!("Your lead for {} was approved", updated.company)
        };
        self.notify_submitter(
            &updated,
            NotificationKind::LeadApproved,
            LeadEventKind::LeadApproved,
            "Lead approved",
            message,
        )
        .await;

        Ok(ApprovalOutcome {
            lead: updated,
            crm_synced,
        })
    }

    /// Rejects a pending lead
    ///
    /// Records who rejected it and, when a reason is given, appends it to
    /// the description without destroying the original text. No CRM
    /// interaction.
    pub async fn reject(
        &self,
        lead_id: Uuid,
        admin_id: Uuid,
        reason: Option<String>,
    ) -> Result<Lead, LifecycleError> {
        let lead = self.load_for_decision(lead_id, LeadStatus::Rejected).await?;

        let description = reason
            .as_deref()
            .map(|r| append_reason(lead.description.as_deref(), r));

        let updated = self
            .leads
            .update_status(
                lead_id,
                LeadStatus::Pending,
                LeadDecision::reject(admin_id, description),
            )
            .await?
            .ok_or(LifecycleError::InvalidState(lead_id))?;

        info!(lead_id = %lead_id, admin = %admin_id, "Lead rejected");

        let message = match reason.as_deref() {
            Some(r) => format!("Your lead for {} was rejected: {}", updated.company, r),
            None => format!("Your lead for {} was rejected", updated.company),
        };
        self.notify_submitter(
            &updated,
            NotificationKind::LeadRejected,
            LeadEventKind::LeadRejected,
            "Lead rejected",
            message,
        )
        .await;

        Ok(updated)
    }

    /// CRM health check pass-through; always returns a report
    pub async fn test_crm_connection(&self) -> CrmHealth {
        match self.crm.test_connection().await {
            Ok(identity) => CrmHealth {
                success: true,
                identity: Some(identity),
                error: None,
            },
            Err(e) => CrmHealth {
                success: false,
                identity: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Lists all pending leads, newest first
    pub async fn list_pending(&self) -> Result<Vec<Lead>, LifecycleError> {
        Ok(self.leads.list_pending().await?)
    }

    /// Lists leads by optional status with an accurate total count
    ///
    /// `page` is 1-based; `page_size` is clamped to 1..=100.
    pub async fn list_by_status(
        &self,
        status: Option<LeadStatus>,
        page: u32,
        page_size: u32,
    ) -> Result<LeadPage, LifecycleError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);
        let offset = i64::from(page - 1) * i64::from(page_size);

        let leads = self
            .leads
            .list(status, i64::from(page_size), offset)
            .await?;
        let total = self.leads.count(status).await?;

        Ok(LeadPage {
            leads,
            page,
            page_size,
            total,
        })
    }

    /// Counts leads grouped by status, optionally scoped to one submitter
    pub async fn count_by_status(
        &self,
        submitted_by: Option<Uuid>,
    ) -> Result<LeadCounts, LifecycleError> {
        Ok(self.leads.count_by_status(submitted_by).await?)
    }

    /// Loads a lead and verifies the intended transition is legal
    ///
    /// Advisory only; the conditional update is what actually decides a
    /// race. This check exists to answer NotFound vs InvalidState without
    /// attempting a write.
    async fn load_for_decision(
        &self,
        lead_id: Uuid,
        target: LeadStatus,
    ) -> Result<Lead, LifecycleError> {
        let lead = self
            .leads
            .find_by_id(lead_id)
            .await?
            .ok_or(LifecycleError::NotFound(lead_id))?;

        if !lead.status.can_transition_to(target) {
            return Err(LifecycleError::InvalidState(lead_id));
        }

        Ok(lead)
    }

    /// Durable + best-effort fan-out to every administrator
    async fn notify_admins(&self, lead: &Lead) -> Result<(), StoreError> {
        let admins = self.admins.list_admins().await?;
        if admins.is_empty() {
            return Ok(());
        }

        let title = "New lead pending";
        let message = format!(
            "{} {} from {} submitted a new lead for approval",
            lead.first_name, lead.last_name, lead.company
        );

        let entries = admins
            .iter()
            .map(|admin| CreateNotification {
                title: title.to_string(),
                message: message.clone(),
                kind: NotificationKind::NewLead,
                user_id: admin.id,
                lead_id: Some(lead.id),
            })
            .collect();
        self.notifications.create_many(entries).await?;

        for admin in &admins {
            self.publish_event(admin.id, LeadEventKind::NewLead, lead, title, &message)
                .await;
        }

        Ok(())
    }

    /// Durable notification + best-effort event to the original submitter
    ///
    /// Both failures are swallowed: the state transition already committed.
    async fn notify_submitter(
        &self,
        lead: &Lead,
        kind: NotificationKind,
        event_kind: LeadEventKind,
        title: &str,
        message: String,
    ) {
        let result = self
            .notifications
            .create(CreateNotification {
                title: title.to_string(),
                message: message.clone(),
                kind,
                user_id: lead.submitted_by_id,
                lead_id: Some(lead.id),
            })
            .await;

        if let Err(e) = result {
            warn!(lead_id = %lead.id, error = %e, "Submitter notification failed");
        }

        self.publish_event(lead.submitted_by_id, event_kind, lead, title, &message)
            .await;
    }

    /// Best-effort real-time publish; failures are logged, never surfaced
    async fn publish_event(
        &self,
        user_id: Uuid,
        kind: LeadEventKind,
        lead: &Lead,
        title: &str,
        message: &str,
    ) {
        let event = LeadEvent::new(kind, lead, title.to_string(), message.to_string());

        if let Err(e) = self.publisher.publish(&user_channel(user_id), &event).await {
            warn!(
                user_id = %user_id,
                kind = kind.as_str(),
                error = %e,
                "Real-time event dropped"
            );
        }
    }
}

/// Appends a rejection reason, preserving any existing description
fn append_reason(description: Option<&str>, reason: &str) -> String {
    match description {
        Some(existing) if !existing.trim().is_empty() => {
            format!("{existing}{REJECTION_SEPARATOR}{reason}")
        }
        _ => format!("{}{}", REJECTION_SEPARATOR.trim_start(), reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_reason_preserves_original() {
        let appended = append_reason(Some("Met at conference"), "duplicate entry");
        assert!(appended.starts_with("Met at conference"));
        assert!(appended.ends_with("Rejection reason: duplicate entry"));
    }

    #[test]
    fn test_append_reason_without_original() {
        assert_eq!(
            append_reason(None, "no budget"),
            "Rejection reason: no budget"
        );
        assert_eq!(
            append_reason(Some("   "), "no budget"),
            "Rejection reason: no budget"
        );
    }
}
