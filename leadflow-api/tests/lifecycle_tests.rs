/// Lifecycle manager integration tests
///
/// Exercise the full submit/approve/reject orchestration against in-memory
/// backends: a mutex-guarded lead store with the same conditional-update
/// guarantee as the SQL implementation, a recording notification sink, a
/// fixed admin directory, scriptable CRM stubs, and a capturing publisher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use leadflow_api::crm::{CrmConnector, CrmError, CrmIdentity, RemoteRecord};
use leadflow_api::lifecycle::store::{
    AdminDirectory, LeadStore, NotificationSink, StoreError,
};
use leadflow_api::lifecycle::{LifecycleError, LifecycleManager, SubmitLead};
use leadflow_api::publish::{EventPublisher, PublishError};
use leadflow_shared::events::{user_channel, LeadEvent, LeadEventKind};
use leadflow_shared::models::{
    lead::{CreateLead, Lead, LeadCounts, LeadDecision, LeadStatus},
    notification::{CreateNotification, Notification, NotificationKind},
    user::{User, UserRole},
};

/// In-memory lead store with the same conditional-update semantics as the
/// SQL backend: the status guard and the mutation happen under one lock.
#[derive(Default)]
struct InMemoryLeadStore {
    leads: Mutex<HashMap<Uuid, Lead>>,
    create_calls: AtomicUsize,
}

impl InMemoryLeadStore {
    fn get(&self, id: Uuid) -> Option<Lead> {
        self.leads.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn create(&self, data: CreateLead) -> Result<Lead, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            first_name: data.first_name,
            last_name: data.last_name,
            email: data.email,
            phone: data.phone,
            company: data.company,
            position: data.position,
            description: data.description,
            status: LeadStatus::Pending,
            submitted_by_id: data.submitted_by_id,
            approved_by_id: None,
            remote_crm_id: None,
            created_at: now,
            updated_at: now,
        };

        self.leads.lock().unwrap().insert(lead.id, lead.clone());
        Ok(lead)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, StoreError> {
        Ok(self.get(id))
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: LeadStatus,
        patch: LeadDecision,
    ) -> Result<Option<Lead>, StoreError> {
        let mut leads = self.leads.lock().unwrap();
        let Some(lead) = leads.get_mut(&id) else {
            return Ok(None);
        };
        if lead.status != expected {
            return Ok(None);
        }

        lead.status = patch.status;
        lead.approved_by_id = Some(patch.decided_by);
        if patch.remote_crm_id.is_some() {
            lead.remote_crm_id = patch.remote_crm_id;
        }
        if patch.description.is_some() {
            lead.description = patch.description;
        }
        lead.updated_at = Utc::now();

        Ok(Some(lead.clone()))
    }

    async fn list(
        &self,
        status: Option<LeadStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Lead>, StoreError> {
        let mut leads: Vec<Lead> = self
            .leads
            .lock()
            .unwrap()
            .values()
            .filter(|l| status.map_or(true, |s| l.status == s))
            .cloned()
            .collect();
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(leads
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn list_pending(&self) -> Result<Vec<Lead>, StoreError> {
        self.list(Some(LeadStatus::Pending), i64::MAX, 0).await
    }

    async fn count(&self, status: Option<LeadStatus>) -> Result<i64, StoreError> {
        Ok(self
            .leads
            .lock()
            .unwrap()
            .values()
            .filter(|l| status.map_or(true, |s| l.status == s))
            .count() as i64)
    }

    async fn count_by_status(&self, submitted_by: Option<Uuid>) -> Result<LeadCounts, StoreError> {
        let leads = self.leads.lock().unwrap();
        let mut counts = LeadCounts::default();
        for lead in leads
            .values()
            .filter(|l| submitted_by.map_or(true, |u| l.submitted_by_id == u))
        {
            counts.total += 1;
            match lead.status {
                LeadStatus::Pending => counts.pending += 1,
                LeadStatus::Approved => counts.approved += 1,
                LeadStatus::Rejected => counts.rejected += 1,
            }
        }
        Ok(counts)
    }
}

/// Notification sink that records every write; optionally fails to verify
/// the manager swallows sink errors after the state transition commits.
#[derive(Default)]
struct RecordingSink {
    entries: Mutex<Vec<CreateNotification>>,
    fail: bool,
}

impl RecordingSink {
    fn failing() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn recorded(&self) -> Vec<CreateNotification> {
        self.entries.lock().unwrap().clone()
    }

    fn materialize(&self, entry: &CreateNotification) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            title: entry.title.clone(),
            message: entry.message.clone(),
            kind: entry.kind,
            read: false,
            user_id: entry.user_id,
            lead_id: entry.lead_id,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn create(&self, entry: CreateNotification) -> Result<Notification, StoreError> {
        if self.fail {
            return Err(StoreError::Backend("sink down".to_string()));
        }
        let created = self.materialize(&entry);
        self.entries.lock().unwrap().push(entry);
        Ok(created)
    }

    async fn create_many(
        &self,
        entries: Vec<CreateNotification>,
    ) -> Result<Vec<Notification>, StoreError> {
        if self.fail {
            return Err(StoreError::Backend("sink down".to_string()));
        }
        let created = entries.iter().map(|e| self.materialize(e)).collect();
        self.entries.lock().unwrap().extend(entries);
        Ok(created)
    }
}

/// Fixed administrator directory
struct FixedAdmins {
    admins: Vec<User>,
}

#[async_trait]
impl AdminDirectory for FixedAdmins {
    async fn list_admins(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.admins.clone())
    }
}

/// CRM stub that either hands out a fixed remote ID or always fails
struct StubCrm {
    remote_id: Option<String>,
    calls: AtomicUsize,
}

impl StubCrm {
    fn succeeding(remote_id: &str) -> Self {
        Self {
            remote_id: Some(remote_id.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            remote_id: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CrmConnector for StubCrm {
    async fn create_remote_record(&self, _lead: &Lead) -> Result<RemoteRecord, CrmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.remote_id {
            Some(id) => Ok(RemoteRecord { id: id.clone() }),
            None => Err(CrmError::Unreachable("connection refused".to_string())),
        }
    }

    async fn test_connection(&self) -> Result<CrmIdentity, CrmError> {
        match &self.remote_id {
            Some(_) => Ok(CrmIdentity {
                display_name: "integration@crm".to_string(),
                organization: Some("Acme CRM".to_string()),
            }),
            None => Err(CrmError::Unreachable("connection refused".to_string())),
        }
    }
}

/// Publisher that captures every event instead of pushing it anywhere
#[derive(Default)]
struct CapturingPublisher {
    events: Mutex<Vec<(String, LeadEvent)>>,
}

impl CapturingPublisher {
    fn captured(&self) -> Vec<(String, LeadEvent)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for CapturingPublisher {
    async fn publish(&self, channel: &str, event: &LeadEvent) -> Result<(), PublishError> {
        self.events
            .lock()
            .unwrap()
            .push((channel.to_string(), event.clone()));
        Ok(())
    }
}

fn admin(first_name: &str) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: format!("{}@leadflow.test", first_name.to_lowercase()),
        password_hash: "!".to_string(),
        first_name: first_name.to_string(),
        last_name: "Admin".to_string(),
        role: UserRole::Admin,
        created_at: now,
        updated_at: now,
        last_login_at: None,
    }
}

fn submission() -> SubmitLead {
    SubmitLead {
        first_name: "Ana".to_string(),
        last_name: "Ruiz".to_string(),
        email: "ana.ruiz@example.com".to_string(),
        phone: Some("+34 600 000 000".to_string()),
        company: "Globex".to_string(),
        position: Some("CTO".to_string()),
        description: Some("Met at the Madrid expo".to_string()),
    }
}

struct Harness {
    manager: LifecycleManager,
    store: Arc<InMemoryLeadStore>,
    sink: Arc<RecordingSink>,
    crm: Arc<StubCrm>,
    publisher: Arc<CapturingPublisher>,
    admins: Vec<User>,
}

fn harness_with(crm: StubCrm, sink: RecordingSink, admins: Vec<User>) -> Harness {
    let store = Arc::new(InMemoryLeadStore::default());
    let sink = Arc::new(sink);
    let crm = Arc::new(crm);
    let publisher = Arc::new(CapturingPublisher::default());

    let manager = LifecycleManager::new(
        store.clone(),
        sink.clone(),
        Arc::new(FixedAdmins {
            admins: admins.clone(),
        }),
        crm.clone(),
        publisher.clone(),
    );

    Harness {
        manager,
        store,
        sink,
        crm,
        publisher,
        admins,
    }
}

fn harness() -> Harness {
    harness_with(
        StubCrm::succeeding("SF-001"),
        RecordingSink::default(),
        vec![admin("Ines"), admin("Marco")],
    )
}

#[tokio::test]
async fn test_submit_creates_pending_lead() {
    let h = harness();
    let submitter = Uuid::new_v4();

    let submitted = h.manager.submit(submission(), submitter).await.unwrap();

    assert_eq!(submitted.status, LeadStatus::Pending);
    let stored = h.store.get(submitted.id).unwrap();
    assert_eq!(stored.status, LeadStatus::Pending);
    assert_eq!(stored.submitted_by_id, submitter);
    assert!(stored.approved_by_id.is_none());
    assert!(stored.remote_crm_id.is_none());
}

#[tokio::test]
async fn test_submit_fans_out_to_every_admin() {
    let h = harness();

    let submitted = h.manager.submit(submission(), Uuid::new_v4()).await.unwrap();

    let entries = h.sink.recorded();
    assert_eq!(entries.len(), 2);
    for entry in &entries {
        assert_eq!(entry.kind, NotificationKind::NewLead);
        assert_eq!(entry.lead_id, Some(submitted.id));
        assert_eq!(
            entry.message,
            "Ana Ruiz from Globex submitted a new lead for approval"
        );
    }
    let recipients: Vec<Uuid> = entries.iter().map(|e| e.user_id).collect();
    for admin in &h.admins {
        assert!(recipients.contains(&admin.id));
    }

    let events = h.publisher.captured();
    assert_eq!(events.len(), 2);
    for (channel, event) in &events {
        assert_eq!(event.kind, LeadEventKind::NewLead);
        assert!(h.admins.iter().any(|a| channel == &user_channel(a.id)));
    }
}

#[tokio::test]
async fn test_submit_rejects_invalid_input_without_persisting() {
    let h = harness();
    let mut data = submission();
    data.company = "   ".to_string();
    data.email = "not-an-email".to_string();

    let err = h.manager.submit(data, Uuid::new_v4()).await.unwrap_err();

    match err {
        LifecycleError::Validation(fields) => {
            assert!(fields.iter().any(|f| f.field == "company"));
            assert!(fields.iter().any(|f| f.field == "email"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(h.store.create_calls.load(Ordering::SeqCst), 0);
    assert!(h.sink.recorded().is_empty());
    assert!(h.publisher.captured().is_empty());
}

#[tokio::test]
async fn test_submit_survives_notification_outage() {
    let h = harness_with(
        StubCrm::succeeding("SF-001"),
        RecordingSink::failing(),
        vec![admin("Ines")],
    );

    let submitted = h.manager.submit(submission(), Uuid::new_v4()).await.unwrap();

    assert_eq!(submitted.status, LeadStatus::Pending);
    assert!(h.store.get(submitted.id).is_some());
}

#[tokio::test]
async fn test_approve_mirrors_to_crm_and_notifies_submitter() {
    let h = harness();
    let submitter = Uuid::new_v4();
    let admin_id = h.admins[0].id;

    let submitted = h.manager.submit(submission(), submitter).await.unwrap();
    let outcome = h.manager.approve(submitted.id, admin_id).await.unwrap();

    assert!(outcome.crm_synced);
    assert_eq!(outcome.lead.status, LeadStatus::Approved);
    assert_eq!(outcome.lead.approved_by_id, Some(admin_id));
    assert_eq!(outcome.lead.remote_crm_id.as_deref(), Some("SF-001"));
    assert_eq!(h.crm.calls.load(Ordering::SeqCst), 1);

    // Submission fanned out one entry per admin; approval adds exactly one
    // more, to the submitter, and nobody else hears about it
    let entries = h.sink.recorded();
    assert_eq!(entries.len(), h.admins.len() + 1);
    let approved: Vec<_> = entries
        .iter()
        .filter(|e| e.kind == NotificationKind::LeadApproved)
        .collect();
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].user_id, submitter);
    assert!(approved[0].message.contains("Globex"));
    assert!(approved[0].message.contains("sent to the CRM"));
}

#[tokio::test]
async fn test_approve_tolerates_crm_failure() {
    let h = harness_with(
        StubCrm::failing(),
        RecordingSink::default(),
        vec![admin("Ines")],
    );
    let submitter = Uuid::new_v4();
    let admin_id = h.admins[0].id;

    let submitted = h.manager.submit(submission(), submitter).await.unwrap();
    let outcome = h.manager.approve(submitted.id, admin_id).await.unwrap();

    // The local decision is the source of truth; the failed mirror is
    // reported, not raised.
    assert!(!outcome.crm_synced);
    assert_eq!(outcome.lead.status, LeadStatus::Approved);
    assert!(outcome.lead.remote_crm_id.is_none());

    let to_submitter: Vec<_> = h
        .sink
        .recorded()
        .into_iter()
        .filter(|e| e.user_id == submitter)
        .collect();
    assert_eq!(to_submitter.len(), 1);
    assert!(!to_submitter[0].message.contains("CRM"));
}

#[tokio::test]
async fn test_approve_unknown_lead_is_not_found() {
    let h = harness();

    let err = h
        .manager
        .approve(Uuid::new_v4(), h.admins[0].id)
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::NotFound(_)));
    assert_eq!(h.crm.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_decided_lead_cannot_be_decided_again() {
    let h = harness();
    let admin_id = h.admins[0].id;

    let submitted = h.manager.submit(submission(), Uuid::new_v4()).await.unwrap();
    h.manager.approve(submitted.id, admin_id).await.unwrap();

    let again = h.manager.approve(submitted.id, admin_id).await.unwrap_err();
    assert!(matches!(again, LifecycleError::InvalidState(_)));

    let reject = h
        .manager
        .reject(submitted.id, admin_id, None)
        .await
        .unwrap_err();
    assert!(matches!(reject, LifecycleError::InvalidState(_)));

    let stored = h.store.get(submitted.id).unwrap();
    assert_eq!(stored.status, LeadStatus::Approved);
}

#[tokio::test]
async fn test_concurrent_decisions_have_exactly_one_winner() {
    let h = harness();
    let approver = h.admins[0].id;
    let rejecter = h.admins[1].id;

    let submitted = h.manager.submit(submission(), Uuid::new_v4()).await.unwrap();

    let (approved, rejected) = tokio::join!(
        h.manager.approve(submitted.id, approver),
        h.manager.reject(submitted.id, rejecter, None),
    );

    // Both callers pass the pending pre-check; the conditional update
    // decides the race, so exactly one wins.
    let winners = usize::from(approved.is_ok()) + usize::from(rejected.is_ok());
    assert_eq!(winners, 1);

    let stored = h.store.get(submitted.id).unwrap();
    match (&approved, &rejected) {
        (Ok(_), Err(LifecycleError::InvalidState(_))) => {
            assert_eq!(stored.status, LeadStatus::Approved);
            assert_eq!(stored.approved_by_id, Some(approver));
        }
        (Err(LifecycleError::InvalidState(_)), Ok(_)) => {
            assert_eq!(stored.status, LeadStatus::Rejected);
            assert_eq!(stored.approved_by_id, Some(rejecter));
        }
        other => panic!("unexpected race outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_reject_appends_reason_to_description() {
    let h = harness();
    let submitter = Uuid::new_v4();
    let admin_id = h.admins[0].id;

    let submitted = h.manager.submit(submission(), submitter).await.unwrap();
    let lead = h
        .manager
        .reject(submitted.id, admin_id, Some("duplicate entry".to_string()))
        .await
        .unwrap();

    assert_eq!(lead.status, LeadStatus::Rejected);
    assert_eq!(lead.approved_by_id, Some(admin_id));
    let description = lead.description.unwrap();
    assert!(description.starts_with("Met at the Madrid expo"));
    assert!(description.ends_with("Rejection reason: duplicate entry"));

    let entries = h.sink.recorded();
    assert_eq!(entries.len(), h.admins.len() + 1);
    let to_submitter: Vec<_> = entries
        .iter()
        .filter(|e| e.user_id == submitter)
        .collect();
    assert_eq!(to_submitter.len(), 1);
    assert_eq!(to_submitter[0].kind, NotificationKind::LeadRejected);
    assert!(to_submitter[0].message.contains("duplicate entry"));
}

#[tokio::test]
async fn test_reject_without_reason_keeps_description() {
    let h = harness();
    let admin_id = h.admins[0].id;

    let submitted = h.manager.submit(submission(), Uuid::new_v4()).await.unwrap();
    let lead = h.manager.reject(submitted.id, admin_id, None).await.unwrap();

    assert_eq!(lead.status, LeadStatus::Rejected);
    assert_eq!(lead.description.as_deref(), Some("Met at the Madrid expo"));
    assert!(lead.remote_crm_id.is_none());
}

#[tokio::test]
async fn test_crm_health_reports_both_outcomes() {
    let healthy = harness();
    let report = healthy.manager.test_crm_connection().await;
    assert!(report.success);
    assert_eq!(report.identity.unwrap().display_name, "integration@crm");
    assert!(report.error.is_none());

    let broken = harness_with(StubCrm::failing(), RecordingSink::default(), vec![]);
    let report = broken.manager.test_crm_connection().await;
    assert!(!report.success);
    assert!(report.identity.is_none());
    assert!(report.error.unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_list_by_status_paginates_with_total() {
    let h = harness();
    for i in 0..5 {
        let mut data = submission();
        data.email = format!("lead{i}@example.com");
        h.manager.submit(data, Uuid::new_v4()).await.unwrap();
    }

    let page = h
        .manager
        .list_by_status(Some(LeadStatus::Pending), 1, 2)
        .await
        .unwrap();
    assert_eq!(page.leads.len(), 2);
    assert_eq!(page.total, 5);

    let last = h
        .manager
        .list_by_status(Some(LeadStatus::Pending), 3, 2)
        .await
        .unwrap();
    assert_eq!(last.leads.len(), 1);

    // Out-of-range parameters are normalized, not rejected
    let normalized = h.manager.list_by_status(None, 0, 500).await.unwrap();
    assert_eq!(normalized.page, 1);
    assert_eq!(normalized.page_size, 100);
}

#[tokio::test]
async fn test_counts_follow_the_workflow() {
    let h = harness();
    let submitter = Uuid::new_v4();
    let admin_id = h.admins[0].id;

    let a = h.manager.submit(submission(), submitter).await.unwrap();
    let b = h.manager.submit(submission(), submitter).await.unwrap();
    h.manager.submit(submission(), Uuid::new_v4()).await.unwrap();

    h.manager.approve(a.id, admin_id).await.unwrap();
    h.manager.reject(b.id, admin_id, None).await.unwrap();

    let all = h.manager.count_by_status(None).await.unwrap();
    assert_eq!(all.total, 3);
    assert_eq!(all.pending, 1);
    assert_eq!(all.approved, 1);
    assert_eq!(all.rejected, 1);

    let mine = h.manager.count_by_status(Some(submitter)).await.unwrap();
    assert_eq!(mine.total, 2);
    assert_eq!(mine.pending, 0);
}
