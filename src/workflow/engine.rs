use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::action::WorkflowAction;
use super::errors::WorkflowError;
use crate::actor::Actor;
use crate::listing::{
    ActionType, ApprovalStatus, AuditField, AuditTrail, Document, ListingContent, ListingRecord,
    ListingStatus, Provenance,
};

/// Source of the timestamps stamped into audit fields.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Status change plus the audit fields that travel with it.
///
/// `set` and `clear` are always applied together with `status`; a caller
/// never persists one without the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFields {
    pub status: ListingStatus,
    pub approval_status: Option<ApprovalStatus>,
    pub set: AuditTrail,
    pub clear: Vec<AuditField>,
}

impl StatusFields {
    fn new(status: ListingStatus, approval_status: ApprovalStatus, set: AuditTrail) -> Self {
        Self {
            status,
            approval_status: Some(approval_status),
            set,
            clear: Vec::new(),
        }
    }

    pub fn apply(&self, record: &mut ListingRecord) {
        record.status = self.status;
        if self.approval_status.is_some() {
            record.approval_status = self.approval_status;
        }
        record.audit.merge(&self.set);
        for field in &self.clear {
            record.audit.clear(*field);
        }
    }

    /// Store patch equivalent of [`apply`](Self::apply); cleared fields become `null`.
    pub fn to_patch(&self) -> Result<Document, serde_json::Error> {
        let mut patch = match serde_json::to_value(&self.set)? {
            serde_json::Value::Object(map) => map,
            _ => Document::new(),
        };
        patch.insert("status".to_string(), serde_json::to_value(self.status)?);
        if let Some(approval_status) = self.approval_status {
            patch.insert(
                "approval_status".to_string(),
                serde_json::to_value(approval_status)?,
            );
        }
        for field in &self.clear {
            patch.insert(field.key().to_string(), serde_json::Value::Null);
        }
        Ok(patch)
    }
}

/// How an edit reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateDecision {
    /// Overwrite the record in place; it keeps `status`.
    ApplyDirectly { status: ListingStatus },
    /// Store the edit as a new pending record pointing at `original_id`.
    SubmitForReview { original_id: String },
}

impl UpdateDecision {
    pub fn apply_directly(&self) -> bool {
        matches!(self, UpdateDecision::ApplyDirectly { .. })
    }

    /// Status of whatever record the edit ends up in.
    pub fn status(&self) -> ListingStatus {
        match self {
            UpdateDecision::ApplyDirectly { status } => *status,
            UpdateDecision::SubmitForReview { .. } => ListingStatus::Pending,
        }
    }
}

/// Tells the caller to remove a record from the store. No status is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalSignal {
    pub listing_id: String,
    pub from: ListingStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionDecision {
    RemoveNow(RemovalSignal),
    Request(StatusFields),
}

/// Privileged, or the submitter by id or email.
pub fn can_edit(actor: &Actor, record: &ListingRecord) -> bool {
    actor.is_privileged() || record.is_submitted_by(actor)
}

pub fn can_delete(actor: &Actor, record: &ListingRecord) -> bool {
    can_edit(actor, record)
}

/// Decides statuses and audit stamps for listing transitions.
///
/// The engine performs no I/O and keeps no state between calls; every
/// decision is derived from the record and actor it is handed.
#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    clock: Arc<dyn Clock>,
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowEngine {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn decide_initial_status(&self, actor: &Actor) -> ListingStatus {
        if actor.is_privileged() {
            ListingStatus::Aktif
        } else {
            ListingStatus::Pending
        }
    }

    pub fn decide_update(&self, actor: &Actor, existing: &ListingRecord) -> UpdateDecision {
        let owns_settled_record =
            existing.is_submitted_by(actor) && existing.status != ListingStatus::Pending;

        if actor.is_privileged() || owns_settled_record {
            UpdateDecision::ApplyDirectly {
                status: existing.status,
            }
        } else {
            UpdateDecision::SubmitForReview {
                original_id: existing.id.clone(),
            }
        }
    }

    pub fn approve(
        &self,
        record: &ListingRecord,
        approver_name: &str,
    ) -> Result<StatusFields, WorkflowError> {
        require_status(record, ListingStatus::Pending, WorkflowAction::Approve)?;

        Ok(StatusFields::new(
            ListingStatus::Aktif,
            ApprovalStatus::Approved,
            AuditTrail {
                approved_by: Some(approver_name.to_string()),
                approved_at: Some(self.now()),
                ..Default::default()
            },
        ))
    }

    pub fn reject(
        &self,
        record: &ListingRecord,
        approver_name: &str,
        reason: &str,
    ) -> Result<StatusFields, WorkflowError> {
        let reason = required_reason(reason, "a rejection reason is required")?;
        require_status(record, ListingStatus::Pending, WorkflowAction::Reject)?;

        Ok(StatusFields::new(
            ListingStatus::Rejected,
            ApprovalStatus::Rejected,
            AuditTrail {
                rejected_by: Some(approver_name.to_string()),
                rejected_at: Some(self.now()),
                rejection_reason: Some(reason),
                ..Default::default()
            },
        ))
    }

    pub fn request_deletion(
        &self,
        record: &ListingRecord,
        actor: &Actor,
        reason: &str,
    ) -> Result<DeletionDecision, WorkflowError> {
        if actor.is_privileged() {
            debug!(listing_id = %record.id, role = %actor.role, "Privileged deletion bypasses review");
            return Ok(DeletionDecision::RemoveNow(RemovalSignal {
                listing_id: record.id.clone(),
                from: record.status,
            }));
        }
        if !can_delete(actor, record) {
            return Err(WorkflowError::PermissionDenied {
                actor: actor.display_name().to_string(),
                role: actor.role,
                action: WorkflowAction::RequestDeletion,
            });
        }
        let reason = required_reason(reason, "a deletion reason is required")?;
        require_status(record, ListingStatus::Aktif, WorkflowAction::RequestDeletion)?;

        Ok(DeletionDecision::Request(StatusFields::new(
            ListingStatus::PendingDeletion,
            ApprovalStatus::PendingDeletion,
            AuditTrail {
                deletion_requested_by: Some(actor.display_name().to_string()),
                deletion_requester_email: (!actor.email.is_empty()).then(|| actor.email.clone()),
                deletion_requested_at: Some(self.now()),
                deletion_reason: Some(reason),
                ..Default::default()
            },
        )))
    }

    pub fn approve_deletion(&self, record: &ListingRecord) -> Result<RemovalSignal, WorkflowError> {
        require_status(
            record,
            ListingStatus::PendingDeletion,
            WorkflowAction::ApproveDeletion,
        )?;
        Ok(RemovalSignal {
            listing_id: record.id.clone(),
            from: record.status,
        })
    }

    pub fn reject_deletion(
        &self,
        record: &ListingRecord,
        approver_name: &str,
        reason: &str,
    ) -> Result<StatusFields, WorkflowError> {
        let reason = required_reason(reason, "a reason for keeping the listing is required")?;
        require_status(
            record,
            ListingStatus::PendingDeletion,
            WorkflowAction::RejectDeletion,
        )?;

        let mut fields = StatusFields::new(
            ListingStatus::Aktif,
            ApprovalStatus::DeletionRejected,
            AuditTrail {
                deletion_rejected_by: Some(approver_name.to_string()),
                deletion_rejected_at: Some(self.now()),
                deletion_rejection_reason: Some(reason),
                ..Default::default()
            },
        );
        fields.clear = AuditField::DELETION_REQUEST.to_vec();
        Ok(fields)
    }

    /// New listing as submitted by `actor`, ready for its first persist.
    pub fn build_submission(&self, actor: &Actor, content: ListingContent) -> ListingRecord {
        let now = self.now();
        let status = self.decide_initial_status(actor);
        let mut record = ListingRecord::new(content, Provenance::from_actor(actor, now), status);

        match status {
            ListingStatus::Aktif => {
                record.approval_status = Some(ApprovalStatus::Approved);
                record.audit.approved_by = Some(actor.display_name().to_string());
                record.audit.approved_at = Some(now);
            }
            _ => {
                record.approval_status = Some(ApprovalStatus::PendingCreate);
                record.action_type = Some(ActionType::Create);
            }
        }
        record
    }

    /// Pending record carrying an edit of `existing` until an admin reviews it.
    pub fn build_update_request(
        &self,
        actor: &Actor,
        existing: &ListingRecord,
        content: ListingContent,
    ) -> ListingRecord {
        let mut record = ListingRecord::new(
            content,
            Provenance::from_actor(actor, self.now()),
            ListingStatus::Pending,
        );
        record.approval_status = Some(ApprovalStatus::PendingUpdate);
        record.action_type = Some(ActionType::Update);
        record.original_id = Some(existing.id.clone());
        record
    }

    /// Bookkeeping stamps for an edit applied in place.
    pub fn edit_stamps(&self, actor: &Actor) -> AuditTrail {
        AuditTrail {
            updated_by: Some(actor.display_name().to_string()),
            edited_at: Some(self.now()),
            ..Default::default()
        }
    }
}

fn require_status(
    record: &ListingRecord,
    expected: ListingStatus,
    action: WorkflowAction,
) -> Result<(), WorkflowError> {
    if record.status == expected {
        Ok(())
    } else {
        Err(WorkflowError::InvalidTransition {
            from: record.status,
            action,
        })
    }
}

fn required_reason(reason: &str, message: &str) -> Result<String, WorkflowError> {
    match reason.trim() {
        "" => Err(WorkflowError::validation(message)),
        reason => Ok(reason.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Role;
    use chrono::TimeZone;

    fn engine() -> WorkflowEngine {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        WorkflowEngine::with_clock(Arc::new(FixedClock(at)))
    }

    fn owner() -> Actor {
        Actor::new("u1", "u1@example.com", "Budi", Role::User)
    }

    fn admin() -> Actor {
        Actor::new("a1", "a1@example.com", "A", Role::Admin)
    }

    fn record(status: ListingStatus) -> ListingRecord {
        let content = ListingContent {
            name: "Tambal Ban Budi".to_string(),
            address: "Jl. Kenanga 3".to_string(),
            latitude: "-6.9".to_string(),
            longitude: "107.6".to_string(),
            ..Default::default()
        };
        let mut record = ListingRecord::new(
            content,
            Provenance::from_actor(&owner(), engine().now()),
            status,
        );
        record.id = "rec-1".to_string();
        record
    }

    #[test]
    fn test_initial_status_depends_only_on_privilege() {
        let engine = engine();
        for role in Role::ALL {
            let actor = Actor::new("x", "x@example.com", "X", role);
            let expected = if matches!(role, Role::Admin | Role::Superadmin) {
                ListingStatus::Aktif
            } else {
                ListingStatus::Pending
            };
            assert_eq!(engine.decide_initial_status(&actor), expected, "role {role}");
        }
    }

    #[test]
    fn test_approve_stamps_approver_and_time() {
        let engine = engine();
        let fields = engine.approve(&record(ListingStatus::Pending), "A").unwrap();

        assert_eq!(fields.status, ListingStatus::Aktif);
        assert_eq!(fields.set.approved_by.as_deref(), Some("A"));
        assert_eq!(fields.set.approved_at, Some(engine.now()));
        assert!(fields.clear.is_empty());
    }

    #[test]
    fn test_approve_outside_pending_is_invalid() {
        let engine = engine();
        for status in [
            ListingStatus::Aktif,
            ListingStatus::Rejected,
            ListingStatus::PendingDeletion,
        ] {
            let record = record(status);
            let before = record.clone();
            let err = engine.approve(&record, "A").unwrap_err();
            assert!(matches!(
                err,
                WorkflowError::InvalidTransition { from, action: WorkflowAction::Approve } if from == status
            ));
            assert_eq!(record, before);
        }
    }

    #[test]
    fn test_blank_rejection_reason_fails_before_status_check() {
        let engine = engine();
        for status in ListingStatus::ALL {
            for reason in ["", "   "] {
                let err = engine.reject(&record(status), "A", reason).unwrap_err();
                assert!(matches!(err, WorkflowError::Validation { .. }));
            }
        }
    }

    #[test]
    fn test_reject_then_approve_is_invalid() {
        let engine = engine();
        let mut record = record(ListingStatus::Pending);
        let fields = engine.reject(&record, "A", "incomplete address").unwrap();
        assert_eq!(fields.status, ListingStatus::Rejected);
        assert_eq!(fields.set.rejected_by.as_deref(), Some("A"));
        assert_eq!(fields.set.rejection_reason.as_deref(), Some("incomplete address"));

        fields.apply(&mut record);
        assert!(matches!(
            engine.approve(&record, "A"),
            Err(WorkflowError::InvalidTransition { from: ListingStatus::Rejected, .. })
        ));
    }

    #[test]
    fn test_owner_requests_deletion_then_admin_approves() {
        let engine = engine();
        let mut record = record(ListingStatus::Aktif);

        let decision = engine
            .request_deletion(&record, &owner(), "broken link")
            .unwrap();
        let DeletionDecision::Request(fields) = decision else {
            panic!("owner request should go through review");
        };
        assert_eq!(fields.status, ListingStatus::PendingDeletion);
        assert_eq!(fields.set.deletion_reason.as_deref(), Some("broken link"));
        assert_eq!(fields.set.deletion_requester_email.as_deref(), Some("u1@example.com"));
        fields.apply(&mut record);

        let signal = engine.approve_deletion(&record).unwrap();
        assert_eq!(signal.listing_id, "rec-1");
        assert_eq!(signal.from, ListingStatus::PendingDeletion);
    }

    #[test]
    fn test_privileged_deletion_removes_immediately() {
        let engine = engine();
        for status in ListingStatus::ALL {
            let decision = engine.request_deletion(&record(status), &admin(), "").unwrap();
            assert!(matches!(decision, DeletionDecision::RemoveNow(_)));
        }
    }

    #[test]
    fn test_deletion_request_checks() {
        let engine = engine();
        let stranger = Actor::new("u2", "u2@example.com", "Sari", Role::User);

        assert!(matches!(
            engine.request_deletion(&record(ListingStatus::Aktif), &stranger, "dup"),
            Err(WorkflowError::PermissionDenied { .. })
        ));
        assert!(matches!(
            engine.request_deletion(&record(ListingStatus::Aktif), &owner(), " "),
            Err(WorkflowError::Validation { .. })
        ));
        assert!(matches!(
            engine.request_deletion(&record(ListingStatus::Pending), &owner(), "dup"),
            Err(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_reject_deletion_restores_aktif_and_clears_request() {
        let engine = engine();
        let mut record = record(ListingStatus::Aktif);
        let original_content = record.content.clone();

        if let DeletionDecision::Request(fields) =
            engine.request_deletion(&record, &owner(), "closed").unwrap()
        {
            fields.apply(&mut record);
        }
        let fields = engine.reject_deletion(&record, "A", "still open").unwrap();
        assert_eq!(fields.clear, AuditField::DELETION_REQUEST.to_vec());
        fields.apply(&mut record);

        assert_eq!(record.status, ListingStatus::Aktif);
        assert_eq!(record.content, original_content);
        assert!(record.audit.deletion_requested_at.is_none());
        assert!(record.audit.deletion_requested_by.is_none());
        assert!(record.audit.deletion_requester_email.is_none());
        assert!(record.audit.deletion_reason.is_none());
        assert_eq!(record.audit.deletion_rejection_reason.as_deref(), Some("still open"));
    }

    #[test]
    fn test_reject_deletion_patch_nulls_cleared_fields() {
        let engine = engine();
        let patch = engine
            .reject_deletion(&record(ListingStatus::PendingDeletion), "A", "still open")
            .unwrap()
            .to_patch()
            .unwrap();

        assert_eq!(patch.get("status"), Some(&serde_json::json!("aktif")));
        for field in AuditField::DELETION_REQUEST {
            assert_eq!(patch.get(field.key()), Some(&serde_json::Value::Null));
        }
        assert_eq!(patch.get("deletion_rejected_by"), Some(&serde_json::json!("A")));
    }

    #[test]
    fn test_can_edit_matches_privilege_or_ownership() {
        let record = record(ListingStatus::Aktif);
        let cases = [
            (Actor::new("u1", "", "", Role::User), true),
            (Actor::new("", "u1@example.com", "", Role::User), true),
            (Actor::new("u9", "u9@example.com", "", Role::User), false),
            (Actor::new("", "", "", Role::Guest), false),
            (Actor::new("u9", "", "", Role::Admin), true),
            (Actor::new("u9", "", "", Role::Superadmin), true),
        ];
        for (actor, expected) in cases {
            assert_eq!(can_edit(&actor, &record), expected, "{actor:?}");
            assert_eq!(can_delete(&actor, &record), expected, "{actor:?}");
        }
    }

    #[test]
    fn test_update_decisions() {
        let engine = engine();
        let aktif = record(ListingStatus::Aktif);
        let pending = record(ListingStatus::Pending);

        assert_eq!(
            engine.decide_update(&owner(), &aktif),
            UpdateDecision::ApplyDirectly { status: ListingStatus::Aktif }
        );
        assert_eq!(
            engine.decide_update(&owner(), &pending),
            UpdateDecision::SubmitForReview { original_id: "rec-1".to_string() }
        );
        assert!(engine.decide_update(&admin(), &pending).apply_directly());
        assert_eq!(engine.decide_update(&owner(), &pending).status(), ListingStatus::Pending);
    }

    #[test]
    fn test_submissions_carry_provenance_and_markers() {
        let engine = engine();
        let pending = engine.build_submission(&owner(), record(ListingStatus::Pending).content);
        assert_eq!(pending.status, ListingStatus::Pending);
        assert_eq!(pending.approval_status, Some(ApprovalStatus::PendingCreate));
        assert_eq!(pending.action_type, Some(ActionType::Create));
        assert_eq!(pending.provenance.submitter_id, "u1");
        assert_eq!(pending.provenance.submitted_at, Some(engine.now()));

        let aktif = engine.build_submission(&admin(), record(ListingStatus::Pending).content);
        assert_eq!(aktif.status, ListingStatus::Aktif);
        assert_eq!(aktif.audit.approved_by.as_deref(), Some("A"));

        let request =
            engine.build_update_request(&owner(), &record(ListingStatus::Pending), aktif.content);
        assert!(request.is_update_request());
        assert_eq!(request.original_id.as_deref(), Some("rec-1"));
        assert_eq!(request.approval_status, Some(ApprovalStatus::PendingUpdate));
    }
}
