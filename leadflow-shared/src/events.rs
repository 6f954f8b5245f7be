/// Real-time event envelopes
///
/// Events published to connected clients when a lead changes state. Delivery
/// is best-effort: events are fire-and-forget, unordered relative to the
/// durable notification write, and dropped when the recipient is not
/// connected. The durable notification rows are the source of truth.
///
/// # Channels
///
/// Each user has one channel, named by [`user_channel`]. Admins subscribe to
/// their own channel and receive `new_lead` events; submitters receive
/// `lead_approved` / `lead_rejected` on theirs.
///
/// # Example
///
/// ```
/// use leadflow_shared::events::{user_channel, LeadEvent, LeadEventKind};
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let channel = user_channel(user_id);
/// assert_eq!(channel, format!("user:{user_id}"));
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::lead::{Lead, LeadStatus};

/// Kind of real-time lead event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadEventKind {
    /// A new lead awaits approval (sent to admins)
    NewLead,

    /// A lead was approved (sent to the submitter)
    LeadApproved,

    /// A lead was rejected (sent to the submitter)
    LeadRejected,
}

impl LeadEventKind {
    /// Event name on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadEventKind::NewLead => "new_lead",
            LeadEventKind::LeadApproved => "lead_approved",
            LeadEventKind::LeadRejected => "lead_rejected",
        }
    }
}

/// Compact lead summary carried in event payloads
///
/// Deliberately smaller than the full model: clients refresh via the REST
/// API for details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadSummary {
    /// Lead ID
    pub id: Uuid,

    /// Contact first name
    pub first_name: String,

    /// Contact last name
    pub last_name: String,

    /// Company
    pub company: String,

    /// Status after the change
    pub status: LeadStatus,
}

impl From<&Lead> for LeadSummary {
    fn from(lead: &Lead) -> Self {
        Self {
            id: lead.id,
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            company: lead.company.clone(),
            status: lead.status,
        }
    }
}

/// Real-time event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadEvent {
    /// What happened
    pub kind: LeadEventKind,

    /// The lead the event concerns
    pub lead: LeadSummary,

    /// Notification title mirrored for immediate display
    pub title: String,

    /// Notification message mirrored for immediate display
    pub message: String,

    /// When the event was emitted
    pub emitted_at: DateTime<Utc>,
}

impl LeadEvent {
    /// Builds a new event envelope, stamped now
    pub fn new(kind: LeadEventKind, lead: &Lead, title: String, message: String) -> Self {
        Self {
            kind,
            lead: LeadSummary::from(lead),
            title,
            message,
            emitted_at: Utc::now(),
        }
    }
}

/// Per-user channel name events are published on
pub fn user_channel(user_id: Uuid) -> String {
    format!("user:{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lead() -> Lead {
        Lead {
            id: Uuid::new_v4(),
            first_name: "Ana".to_string(),
            last_name: "Ruiz".to_string(),
            email: "ana@x.com".to_string(),
            phone: None,
            company: "Acme".to_string(),
            position: None,
            description: None,
            status: LeadStatus::Pending,
            submitted_by_id: Uuid::new_v4(),
            approved_by_id: None,
            remote_crm_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_channel_format() {
        let id = Uuid::nil();
        assert_eq!(
            user_channel(id),
            "user:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_event_round_trips_as_json() {
        let lead = sample_lead();
        let event = LeadEvent::new(
            LeadEventKind::NewLead,
            &lead,
            "New lead pending".to_string(),
            "Ana Ruiz from Acme submitted a lead".to_string(),
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"new_lead\""));

        let parsed: LeadEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.lead.id, lead.id);
        assert_eq!(parsed.kind, LeadEventKind::NewLead);
    }

    #[test]
    fn test_summary_tracks_status() {
        let mut lead = sample_lead();
        lead.status = LeadStatus::Approved;
        let summary = LeadSummary::from(&lead);
        assert_eq!(summary.status, LeadStatus::Approved);
    }
}
