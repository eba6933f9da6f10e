//! Listing flows: submission, editing, review and deletion.
//!
//! Every read goes back to the [`RecordStore`]; the service never keeps a
//! mirror of listing state. Each write decides its outcome through the
//! [`WorkflowEngine`], awaits a single store call per affected document and
//! only then appends to the transition journal.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn, Instrument};

use crate::actor::{Actor, Role};
use crate::config::ListingDefaults;
use crate::listing::{
    AuditTrail, Disposition, Document, ListingDraft, ListingRecord, ListingStatus, PhotoSource,
    MAX_PHOTOS,
};
use crate::media::MediaHost;
use crate::report::{ContributorReport, ReportPeriod};
use crate::store::RecordStore;
use crate::telemetry::{create_workflow_span, generate_correlation_id};
use crate::workflow::{
    can_edit, replay, DeletionDecision, LifecycleEvent, LifecyclePosition, RemovalSignal,
    TransitionRecord, UpdateDecision, WorkflowAction, WorkflowEngine, WorkflowError,
};

/// Result of an edit.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The listing was overwritten in place.
    Applied(ListingRecord),
    /// The edit waits for review as its own pending record.
    Submitted(ListingRecord),
}

impl UpdateOutcome {
    pub fn record(&self) -> &ListingRecord {
        match self {
            UpdateOutcome::Applied(record) | UpdateOutcome::Submitted(record) => record,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeletionOutcome {
    Removed { listing_id: String },
    Requested(ListingRecord),
}

/// Everything waiting for an admin, split by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingQueue {
    pub submissions: Vec<ListingRecord>,
    pub update_requests: Vec<ListingRecord>,
    pub deletion_requests: Vec<ListingRecord>,
}

impl PendingQueue {
    pub fn len(&self) -> usize {
        self.submissions.len() + self.update_requests.len() + self.deletion_requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApprovalStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub pending_deletion: usize,
}

/// A listing that can be drawn on the public map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPin {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: ListingStatus,
}

#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Case-insensitive match on name, address, phone or submitter name.
    pub query: Option<String>,
    pub status: Option<ListingStatus>,
    /// Only listings this actor submitted.
    pub submitted_by: Option<Actor>,
}

impl SearchFilter {
    pub fn matches(&self, record: &ListingRecord) -> bool {
        if self.status.is_some_and(|status| status != record.status) {
            return false;
        }
        if let Some(owner) = &self.submitted_by {
            if !record.is_submitted_by(owner) {
                return false;
            }
        }
        match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => {
                let needle = query.to_lowercase();
                [
                    record.content.name.as_str(),
                    record.content.address.as_str(),
                    record.content.phone.as_str(),
                    record.provenance.submitter_name.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Who is acting and the correlation id shared by the action's log lines and journal entries.
struct ActionContext<'a> {
    actor: &'a Actor,
    correlation_id: String,
}

impl<'a> ActionContext<'a> {
    fn new(actor: &'a Actor) -> Self {
        Self {
            actor,
            correlation_id: generate_correlation_id(),
        }
    }

    fn span(&self, operation: &str, listing_id: Option<&str>) -> tracing::Span {
        create_workflow_span(
            operation,
            listing_id,
            Some(self.actor.id.as_str()),
            &self.correlation_id,
        )
    }

    fn entry(
        &self,
        engine: &WorkflowEngine,
        listing_id: &str,
        action: WorkflowAction,
        event: LifecycleEvent,
        from: Option<ListingStatus>,
        to: Disposition,
    ) -> TransitionRecord {
        TransitionRecord {
            listing_id: listing_id.to_string(),
            action,
            event,
            from,
            to,
            actor_id: self.actor.id.clone(),
            actor_name: self.actor.display_name().to_string(),
            reason: None,
            timestamp: engine.now(),
            correlation_id: self.correlation_id.clone(),
        }
    }
}

pub struct ListingService {
    store: Arc<dyn RecordStore>,
    media: Arc<dyn MediaHost>,
    engine: WorkflowEngine,
    defaults: ListingDefaults,
    journal: RwLock<Vec<TransitionRecord>>,
}

impl ListingService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        media: Arc<dyn MediaHost>,
        engine: WorkflowEngine,
        defaults: ListingDefaults,
    ) -> Self {
        Self {
            store,
            media,
            engine,
            defaults,
            journal: RwLock::new(Vec::new()),
        }
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    /// Validates and persists a new listing. Guests cannot submit.
    pub async fn submit(
        &self,
        actor: &Actor,
        draft: &ListingDraft,
    ) -> Result<ListingRecord, WorkflowError> {
        let ctx = ActionContext::new(actor);
        let span = ctx.span("submit", None);
        self.submit_in(&ctx, draft)
            .instrument(span)
            .await
            .inspect_err(|e| warn!(error = %e, "Listing submission failed"))
    }

    async fn submit_in(
        &self,
        ctx: &ActionContext<'_>,
        draft: &ListingDraft,
    ) -> Result<ListingRecord, WorkflowError> {
        if ctx.actor.role == Role::Guest {
            return Err(permission_denied(ctx.actor, WorkflowAction::Create));
        }

        let mut content = draft.validate(&self.defaults)?;
        let mut photos = self.upload_photos(&draft.photos).await?.into_iter();
        content.photo_primary = photos.next();
        content.photo_secondary = photos.next();

        let record = self.engine.build_submission(ctx.actor, content);
        let status = record.status;
        let id = self.store.create(record.to_document()?).await?;

        let event = match status {
            ListingStatus::Aktif => LifecycleEvent::Publish,
            _ => LifecycleEvent::SubmitForReview,
        };
        self.journal(ctx.entry(
            &self.engine,
            &id,
            WorkflowAction::Create,
            event,
            None,
            Disposition::Stored(status),
        ))
        .await;

        self.load(&id).await
    }

    /// Applies an edit directly or files it for review, whichever the engine decides.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        draft: &ListingDraft,
    ) -> Result<UpdateOutcome, WorkflowError> {
        let ctx = ActionContext::new(actor);
        let span = ctx.span("update", Some(id));
        self.update_in(&ctx, id, draft)
            .instrument(span)
            .await
            .inspect_err(|e| warn!(error = %e, "Listing update failed"))
    }

    async fn update_in(
        &self,
        ctx: &ActionContext<'_>,
        id: &str,
        draft: &ListingDraft,
    ) -> Result<UpdateOutcome, WorkflowError> {
        let existing = self.load(id).await?;
        if !can_edit(ctx.actor, &existing) {
            return Err(permission_denied(ctx.actor, WorkflowAction::Update));
        }

        let mut content = draft.validate(&self.defaults)?;
        let mut photos = self.upload_photos(&draft.photos).await?.into_iter();
        content.photo_primary = photos.next();
        content.photo_secondary = photos.next();

        match self.engine.decide_update(ctx.actor, &existing) {
            UpdateDecision::ApplyDirectly { status } => {
                let mut patch = content.to_patch()?;
                patch.extend(audit_document(&self.engine.edit_stamps(ctx.actor))?);
                self.store.update(id, patch).await?;
                info!(listing_id = %id, status = %status, "Edit applied in place");
                Ok(UpdateOutcome::Applied(self.load(id).await?))
            }
            UpdateDecision::SubmitForReview { original_id } => {
                let request = self
                    .engine
                    .build_update_request(ctx.actor, &existing, content);
                let request_id = self.store.create(request.to_document()?).await?;
                info!(listing_id = %original_id, request_id = %request_id, "Edit filed for review");

                self.journal(ctx.entry(
                    &self.engine,
                    &request_id,
                    WorkflowAction::Update,
                    LifecycleEvent::SubmitForReview,
                    None,
                    Disposition::Stored(ListingStatus::Pending),
                ))
                .await;
                Ok(UpdateOutcome::Submitted(self.load(&request_id).await?))
            }
        }
    }

    /// Publishes a pending listing. An update request is folded into the
    /// listing it edits and then removed; the returned record is the live one.
    pub async fn approve(&self, actor: &Actor, id: &str) -> Result<ListingRecord, WorkflowError> {
        let ctx = ActionContext::new(actor);
        let span = ctx.span("approve", Some(id));
        self.approve_in(&ctx, id)
            .instrument(span)
            .await
            .inspect_err(|e| warn!(error = %e, "Approval failed"))
    }

    async fn approve_in(
        &self,
        ctx: &ActionContext<'_>,
        id: &str,
    ) -> Result<ListingRecord, WorkflowError> {
        require_privilege(ctx.actor, WorkflowAction::Approve)?;
        let record = self.load(id).await?;
        let fields = self.engine.approve(&record, ctx.actor.display_name())?;

        let Some(original_id) = record.original_id.as_deref().filter(|_| record.is_update_request())
        else {
            self.store.update(id, fields.to_patch()?).await?;
            self.journal(ctx.entry(
                &self.engine,
                id,
                WorkflowAction::Approve,
                LifecycleEvent::Approve,
                Some(record.status),
                Disposition::Stored(fields.status),
            ))
            .await;
            return self.load(id).await;
        };

        self.load(original_id).await?;
        let mut patch = record.content.to_patch()?;
        patch.extend(audit_document(&AuditTrail {
            updated_by: Some(record.provenance.submitter_name.clone()),
            edited_at: fields.set.approved_at,
            approved_by: fields.set.approved_by.clone(),
            approved_at: fields.set.approved_at,
            ..Default::default()
        })?);
        self.store.update(original_id, patch).await?;
        self.store.delete(id).await?;

        info!(listing_id = %original_id, request_id = %id, "Update request merged");
        self.journal(ctx.entry(
            &self.engine,
            id,
            WorkflowAction::Approve,
            LifecycleEvent::Remove,
            Some(record.status),
            Disposition::Deleted,
        ))
        .await;
        self.load(original_id).await
    }

    pub async fn reject(
        &self,
        actor: &Actor,
        id: &str,
        reason: &str,
    ) -> Result<ListingRecord, WorkflowError> {
        let ctx = ActionContext::new(actor);
        let span = ctx.span("reject", Some(id));
        self.reject_in(&ctx, id, reason)
            .instrument(span)
            .await
            .inspect_err(|e| warn!(error = %e, "Rejection failed"))
    }

    async fn reject_in(
        &self,
        ctx: &ActionContext<'_>,
        id: &str,
        reason: &str,
    ) -> Result<ListingRecord, WorkflowError> {
        require_privilege(ctx.actor, WorkflowAction::Reject)?;
        let record = self.load(id).await?;
        let fields = self
            .engine
            .reject(&record, ctx.actor.display_name(), reason)?;
        self.store.update(id, fields.to_patch()?).await?;

        let mut entry = ctx.entry(
            &self.engine,
            id,
            WorkflowAction::Reject,
            LifecycleEvent::Reject,
            Some(record.status),
            Disposition::Stored(fields.status),
        );
        entry.reason = fields.set.rejection_reason.clone();
        self.journal(entry).await;
        self.load(id).await
    }

    /// Owners file a deletion request; admins remove the listing outright.
    pub async fn request_deletion(
        &self,
        actor: &Actor,
        id: &str,
        reason: &str,
    ) -> Result<DeletionOutcome, WorkflowError> {
        let ctx = ActionContext::new(actor);
        let span = ctx.span("request_deletion", Some(id));
        self.request_deletion_in(&ctx, id, reason)
            .instrument(span)
            .await
            .inspect_err(|e| warn!(error = %e, "Deletion request failed"))
    }

    async fn request_deletion_in(
        &self,
        ctx: &ActionContext<'_>,
        id: &str,
        reason: &str,
    ) -> Result<DeletionOutcome, WorkflowError> {
        let record = self.load(id).await?;

        match self.engine.request_deletion(&record, ctx.actor, reason)? {
            DeletionDecision::RemoveNow(signal) => {
                self.store.delete(&signal.listing_id).await?;
                let mut entry = ctx.entry(
                    &self.engine,
                    id,
                    WorkflowAction::Delete,
                    LifecycleEvent::Remove,
                    Some(signal.from),
                    Disposition::Deleted,
                );
                entry.reason = Some(reason.trim().to_string()).filter(|r| !r.is_empty());
                self.journal(entry).await;
                Ok(DeletionOutcome::Removed {
                    listing_id: signal.listing_id,
                })
            }
            DeletionDecision::Request(fields) => {
                self.store.update(id, fields.to_patch()?).await?;
                let mut entry = ctx.entry(
                    &self.engine,
                    id,
                    WorkflowAction::RequestDeletion,
                    LifecycleEvent::RequestDeletion,
                    Some(record.status),
                    Disposition::Stored(fields.status),
                );
                entry.reason = fields.set.deletion_reason.clone();
                self.journal(entry).await;
                Ok(DeletionOutcome::Requested(self.load(id).await?))
            }
        }
    }

    pub async fn approve_deletion(
        &self,
        actor: &Actor,
        id: &str,
    ) -> Result<RemovalSignal, WorkflowError> {
        let ctx = ActionContext::new(actor);
        let span = ctx.span("approve_deletion", Some(id));
        self.approve_deletion_in(&ctx, id)
            .instrument(span)
            .await
            .inspect_err(|e| warn!(error = %e, "Deletion approval failed"))
    }

    async fn approve_deletion_in(
        &self,
        ctx: &ActionContext<'_>,
        id: &str,
    ) -> Result<RemovalSignal, WorkflowError> {
        require_privilege(ctx.actor, WorkflowAction::ApproveDeletion)?;
        let record = self.load(id).await?;
        let signal = self.engine.approve_deletion(&record)?;
        self.store.delete(&signal.listing_id).await?;

        self.journal(ctx.entry(
            &self.engine,
            id,
            WorkflowAction::ApproveDeletion,
            LifecycleEvent::ApproveDeletion,
            Some(signal.from),
            Disposition::Deleted,
        ))
        .await;
        Ok(signal)
    }

    pub async fn reject_deletion(
        &self,
        actor: &Actor,
        id: &str,
        reason: &str,
    ) -> Result<ListingRecord, WorkflowError> {
        let ctx = ActionContext::new(actor);
        let span = ctx.span("reject_deletion", Some(id));
        self.reject_deletion_in(&ctx, id, reason)
            .instrument(span)
            .await
            .inspect_err(|e| warn!(error = %e, "Deletion rejection failed"))
    }

    async fn reject_deletion_in(
        &self,
        ctx: &ActionContext<'_>,
        id: &str,
        reason: &str,
    ) -> Result<ListingRecord, WorkflowError> {
        require_privilege(ctx.actor, WorkflowAction::RejectDeletion)?;
        let record = self.load(id).await?;
        let fields = self
            .engine
            .reject_deletion(&record, ctx.actor.display_name(), reason)?;
        self.store.update(id, fields.to_patch()?).await?;

        let mut entry = ctx.entry(
            &self.engine,
            id,
            WorkflowAction::RejectDeletion,
            LifecycleEvent::RejectDeletion,
            Some(record.status),
            Disposition::Stored(fields.status),
        );
        entry.reason = fields.set.deletion_rejection_reason.clone();
        self.journal(entry).await;
        self.load(id).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<ListingRecord>, WorkflowError> {
        match self.store.get_by_id(id).await? {
            Some(document) => Ok(Some(ListingRecord::from_document(document)?)),
            None => Ok(None),
        }
    }

    /// Every readable listing, oldest first. Documents that do not parse as a
    /// listing are logged and left out.
    pub async fn all_listings(&self) -> Result<Vec<ListingRecord>, WorkflowError> {
        let documents = self.store.list_all().await?;
        Ok(documents
            .into_iter()
            .filter_map(|document| {
                let id = document_id(&document);
                ListingRecord::from_document(document)
                    .inspect_err(|e| warn!(id = %id, error = %e, "Skipping unreadable listing"))
                    .ok()
            })
            .collect())
    }

    pub async fn listings_by_status(
        &self,
        status: ListingStatus,
    ) -> Result<Vec<ListingRecord>, WorkflowError> {
        self.search(&SearchFilter {
            status: Some(status),
            ..Default::default()
        })
        .await
    }

    pub async fn pending_queue(&self) -> Result<PendingQueue, WorkflowError> {
        let mut queue = PendingQueue::default();
        for record in self.all_listings().await? {
            match record.status {
                ListingStatus::Pending if record.is_update_request() => {
                    queue.update_requests.push(record)
                }
                ListingStatus::Pending => queue.submissions.push(record),
                ListingStatus::PendingDeletion => queue.deletion_requests.push(record),
                ListingStatus::Aktif | ListingStatus::Rejected => {}
            }
        }
        Ok(queue)
    }

    pub async fn approval_stats(&self) -> Result<ApprovalStats, WorkflowError> {
        let listings = self.all_listings().await?;
        let count = |status: ListingStatus| listings.iter().filter(|r| r.status == status).count();
        Ok(ApprovalStats {
            total: listings.len(),
            pending: count(ListingStatus::Pending),
            approved: count(ListingStatus::Aktif),
            rejected: count(ListingStatus::Rejected),
            pending_deletion: count(ListingStatus::PendingDeletion),
        })
    }

    /// Publicly visible listings with usable coordinates.
    pub async fn map_listings(&self) -> Result<Vec<MapPin>, WorkflowError> {
        Ok(self
            .all_listings()
            .await?
            .into_iter()
            .filter(|record| record.status.is_visible())
            .filter_map(|record| {
                let (latitude, longitude) = record.content.coordinates()?;
                Some(MapPin {
                    id: record.id,
                    name: record.content.name,
                    address: record.content.address,
                    latitude,
                    longitude,
                    status: record.status,
                })
            })
            .collect())
    }

    pub async fn search(&self, filter: &SearchFilter) -> Result<Vec<ListingRecord>, WorkflowError> {
        Ok(self
            .all_listings()
            .await?
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect())
    }

    pub async fn contributor_report(
        &self,
        period: ReportPeriod,
    ) -> Result<ContributorReport, WorkflowError> {
        let listings = self.all_listings().await?;
        Ok(ContributorReport::build(&listings, period, self.engine.now()))
    }

    /// Journal entries recorded for `id` by this service, oldest first.
    pub async fn history(&self, id: &str) -> Vec<TransitionRecord> {
        self.journal
            .read()
            .await
            .iter()
            .filter(|entry| entry.listing_id == id)
            .cloned()
            .collect()
    }

    /// Replays the journal of `id` against the listing lifecycle.
    pub async fn verify_history(&self, id: &str) -> Result<LifecyclePosition, WorkflowError> {
        let history = self.history(id).await;
        replay(id, &history)
    }

    async fn load(&self, id: &str) -> Result<ListingRecord, WorkflowError> {
        let document = self
            .store
            .get_by_id(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(id))?;
        Ok(ListingRecord::from_document(document)?)
    }

    async fn upload_photos(&self, photos: &[PhotoSource]) -> Result<Vec<String>, WorkflowError> {
        let mut urls = Vec::with_capacity(photos.len().min(MAX_PHOTOS));
        for photo in photos.iter().take(MAX_PHOTOS) {
            let url = match photo {
                PhotoSource::Existing { url } => url.clone(),
                PhotoSource::Upload { file_name, bytes } => {
                    self.media.upload(file_name, bytes).await?
                }
            };
            urls.push(url);
        }
        Ok(urls)
    }

    async fn journal(&self, entry: TransitionRecord) {
        entry.log();
        self.journal.write().await.push(entry);
    }
}

fn require_privilege(actor: &Actor, action: WorkflowAction) -> Result<(), WorkflowError> {
    if !action.requires_privilege() || actor.is_privileged() {
        Ok(())
    } else {
        Err(permission_denied(actor, action))
    }
}

fn permission_denied(actor: &Actor, action: WorkflowAction) -> WorkflowError {
    WorkflowError::PermissionDenied {
        actor: actor.display_name().to_string(),
        role: actor.role,
        action,
    }
}

fn audit_document(audit: &AuditTrail) -> Result<Document, serde_json::Error> {
    match serde_json::to_value(audit)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(Document::new()),
    }
}

fn document_id(document: &Document) -> String {
    document
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or("<unknown>")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaError, MockMediaHost};
    use crate::store::{InMemoryStore, MockRecordStore, StoreError};
    use crate::workflow::FixedClock;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn engine() -> WorkflowEngine {
        WorkflowEngine::with_clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2025, 5, 20, 8, 0, 0).unwrap(),
        )))
    }

    fn user() -> Actor {
        Actor::new("u1", "u1@example.com", "Budi", Role::User)
    }

    fn admin() -> Actor {
        Actor::new("a1", "a1@example.com", "A", Role::Admin)
    }

    fn draft() -> ListingDraft {
        ListingDraft::new("Tambal Ban Budi", "Jl. Kenanga 3", "-6.9", "107.6")
    }

    fn service_with(store: Arc<dyn RecordStore>, media: Arc<dyn MediaHost>) -> ListingService {
        ListingService::new(store, media, engine(), ListingDefaults::default())
    }

    fn stored_document(status: &str) -> Document {
        match json!({
            "id": "rec-1",
            "nama": "Tambal Ban Budi",
            "alamat": "Jl. Kenanga 3",
            "latitude": "-6.9",
            "longitude": "107.6",
            "uid_penambah": "u1",
            "email_penambah": "u1@example.com",
            "ditambahkan_oleh": "Budi",
            "status": status,
        }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_failed_store_write_is_surfaced_and_not_journaled() {
        let mut store = MockRecordStore::new();
        store
            .expect_get_by_id()
            .returning(|_| Ok(Some(stored_document("pending"))));
        store.expect_update().times(1).returning(|_, _| {
            Err(StoreError::Unavailable {
                reason: "network down".to_string(),
            })
        });

        let service = service_with(Arc::new(store), Arc::new(MockMediaHost::new()));
        let err = service.approve(&admin(), "rec-1").await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Persistence(StoreError::Unavailable { .. })
        ));
        assert!(err.is_infrastructure());
        assert!(service.history("rec-1").await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_transition_never_touches_store() {
        let mut store = MockRecordStore::new();
        store
            .expect_get_by_id()
            .returning(|_| Ok(Some(stored_document("aktif"))));
        store.expect_update().never();

        let service = service_with(Arc::new(store), Arc::new(MockMediaHost::new()));
        assert!(matches!(
            service.approve(&admin(), "rec-1").await,
            Err(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_photos_are_uploaded_before_persisting() {
        let mut media = MockMediaHost::new();
        media
            .expect_upload()
            .times(1)
            .returning(|name, _| Ok(format!("https://cdn.example/{name}")));

        let service = service_with(Arc::new(InMemoryStore::new()), Arc::new(media));
        let mut draft = draft();
        draft.photos = vec![
            PhotoSource::Existing {
                url: "https://img.example/old.jpg".to_string(),
            },
            PhotoSource::Upload {
                file_name: "front.jpg".to_string(),
                bytes: vec![1, 2, 3],
            },
        ];

        let record = service.submit(&user(), &draft).await.unwrap();
        assert_eq!(record.content.photo_primary.as_deref(), Some("https://img.example/old.jpg"));
        assert_eq!(
            record.content.photo_secondary.as_deref(),
            Some("https://cdn.example/front.jpg")
        );
    }

    #[tokio::test]
    async fn test_failed_upload_aborts_submission() {
        let mut media = MockMediaHost::new();
        media.expect_upload().returning(|_, _| {
            Err(MediaError::Rejected {
                reason: "too large".to_string(),
            })
        });
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store.clone(), Arc::new(media));

        let mut draft = draft();
        draft.photos = vec![PhotoSource::Upload {
            file_name: "big.jpg".to_string(),
            bytes: vec![0; 8],
        }];

        assert!(matches!(
            service.submit(&user(), &draft).await,
            Err(WorkflowError::Media(_))
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_guest_cannot_submit() {
        let service = service_with(Arc::new(InMemoryStore::new()), Arc::new(MockMediaHost::new()));
        assert!(matches!(
            service.submit(&Actor::guest(), &draft()).await,
            Err(WorkflowError::PermissionDenied { role: Role::Guest, .. })
        ));
    }

    #[test]
    fn test_review_actions_need_privilege() {
        for action in [
            WorkflowAction::Approve,
            WorkflowAction::Reject,
            WorkflowAction::ApproveDeletion,
            WorkflowAction::RejectDeletion,
        ] {
            assert!(matches!(
                require_privilege(&user(), action),
                Err(WorkflowError::PermissionDenied { role: Role::User, .. })
            ));
            assert!(require_privilege(&admin(), action).is_ok());
        }
        assert!(require_privilege(&user(), WorkflowAction::Update).is_ok());
    }
}
