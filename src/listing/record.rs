use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::schedule::WeeklySchedule;
use crate::actor::{Actor, Role};

/// Document shape handed to and returned from a [`RecordStore`](crate::store::RecordStore).
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Persisted workflow status. The set is closed: an unknown value in a stored
/// document fails to deserialize instead of being carried along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "aktif")]
    Aktif,
    #[serde(rename = "rejected")]
    Rejected,
    #[serde(rename = "pending_deletion")]
    PendingDeletion,
}

impl ListingStatus {
    pub const ALL: [ListingStatus; 4] = [
        ListingStatus::Pending,
        ListingStatus::Aktif,
        ListingStatus::Rejected,
        ListingStatus::PendingDeletion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Pending => "pending",
            ListingStatus::Aktif => "aktif",
            ListingStatus::Rejected => "rejected",
            ListingStatus::PendingDeletion => "pending_deletion",
        }
    }

    /// Statuses that sit in the admin review queue.
    pub fn awaits_review(self) -> bool {
        matches!(self, ListingStatus::Pending | ListingStatus::PendingDeletion)
    }

    /// Statuses shown to the public on the map.
    pub fn is_visible(self) -> bool {
        matches!(self, ListingStatus::Aktif | ListingStatus::PendingDeletion)
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown listing status '{s}'"))
    }
}

/// Where a record ends up after a transition. `Deleted` is never stored; it
/// tells the caller to remove the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Stored(ListingStatus),
    Deleted,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Stored(status) => status.fmt(f),
            Disposition::Deleted => f.write_str("deleted"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    PendingCreate,
    PendingUpdate,
    Approved,
    Rejected,
    PendingDeletion,
    DeletionRejected,
}

/// Kind of change a record awaiting review represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Create,
    Update,
}

/// Submitter-editable part of a listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListingContent {
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "alamat")]
    pub address: String,
    #[serde(rename = "telepon", default)]
    pub phone: String,
    pub latitude: String,
    pub longitude: String,
    #[serde(rename = "hari_operasional", default, skip_serializing_if = "Option::is_none")]
    pub operating_days: Option<String>,
    #[serde(rename = "jam_operasional", default, skip_serializing_if = "Option::is_none")]
    pub operating_hours: Option<String>,
    #[serde(
        rename = "gambar_1",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_primary: Option<String>,
    #[serde(
        rename = "gambar_2",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_secondary: Option<String>,
    #[serde(flatten)]
    pub schedule: WeeklySchedule,
}

impl ListingContent {
    pub fn photos(&self) -> impl Iterator<Item = &str> {
        self.photo_primary
            .as_deref()
            .into_iter()
            .chain(self.photo_secondary.as_deref())
    }

    /// Store patch replacing the stored content. Optional keys this content
    /// leaves unset are sent as `null` so stale values are removed.
    pub fn to_patch(&self) -> Result<Document, serde_json::Error> {
        let mut patch = match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(serde::ser::Error::custom(format!(
                    "listing content serialized to non-object value: {other}"
                )))
            }
        };
        let optional = ["hari_operasional", "jam_operasional", "gambar_1", "gambar_2"]
            .into_iter()
            .map(str::to_string)
            .chain(WeeklySchedule::document_keys());
        for key in optional {
            patch.entry(key).or_insert(serde_json::Value::Null);
        }
        Ok(patch)
    }

    /// Parsed coordinates, if both strings are valid decimals.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.latitude.trim().parse::<f64>().ok()?;
        let lon = self.longitude.trim().parse::<f64>().ok()?;
        (lat.is_finite() && lon.is_finite()).then_some((lat, lon))
    }
}

/// Who submitted the record and when.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(rename = "ditambahkan_oleh", default)]
    pub submitter_name: String,
    #[serde(rename = "email_penambah", default)]
    pub submitter_email: String,
    #[serde(rename = "uid_penambah", default)]
    pub submitter_id: String,
    #[serde(rename = "role_penambah", default, skip_serializing_if = "Option::is_none")]
    pub submitter_role: Option<Role>,
    #[serde(rename = "tanggal_ditambahkan", default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Provenance {
    pub fn from_actor(actor: &Actor, at: DateTime<Utc>) -> Self {
        Self {
            submitter_name: actor.display_name().to_string(),
            submitter_email: actor.email.clone(),
            submitter_id: actor.id.clone(),
            submitter_role: Some(actor.role),
            submitted_at: Some(at),
        }
    }

    /// Grouping key for contributor statistics.
    pub fn contributor_key(&self) -> &str {
        [
            self.submitter_id.as_str(),
            self.submitter_email.as_str(),
            self.submitter_name.as_str(),
        ]
        .into_iter()
        .find(|k| !k.is_empty())
        .unwrap_or("")
    }
}

/// Audit stamps written by workflow transitions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuditTrail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_requested_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_requester_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_requested_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_rejected_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_rejected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(rename = "updated_at", default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

/// Individually clearable audit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditField {
    DeletionRequestedAt,
    DeletionRequestedBy,
    DeletionRequesterEmail,
    DeletionReason,
}

impl AuditField {
    /// Fields belonging to an outstanding deletion request.
    pub const DELETION_REQUEST: [AuditField; 4] = [
        AuditField::DeletionRequestedAt,
        AuditField::DeletionRequestedBy,
        AuditField::DeletionRequesterEmail,
        AuditField::DeletionReason,
    ];

    pub fn key(self) -> &'static str {
        match self {
            AuditField::DeletionRequestedAt => "deletion_requested_at",
            AuditField::DeletionRequestedBy => "deletion_requested_by",
            AuditField::DeletionRequesterEmail => "deletion_requester_email",
            AuditField::DeletionReason => "deletion_reason",
        }
    }
}

impl AuditTrail {
    /// Overwrites every field that is set in `stamps`.
    pub fn merge(&mut self, stamps: &AuditTrail) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if stamps.$field.is_some() { self.$field = stamps.$field.clone(); })*
            };
        }
        take!(
            approved_by,
            approved_at,
            rejected_by,
            rejected_at,
            rejection_reason,
            deletion_requested_by,
            deletion_requester_email,
            deletion_requested_at,
            deletion_reason,
            deletion_rejected_by,
            deletion_rejected_at,
            deletion_rejection_reason,
            updated_by,
            edited_at,
        );
    }

    pub fn clear(&mut self, field: AuditField) {
        match field {
            AuditField::DeletionRequestedAt => self.deletion_requested_at = None,
            AuditField::DeletionRequestedBy => self.deletion_requested_by = None,
            AuditField::DeletionRequesterEmail => self.deletion_requester_email = None,
            AuditField::DeletionReason => self.deletion_reason = None,
        }
    }
}

/// A tire-repair vendor entry as stored in the listing collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub content: ListingContent,
    #[serde(flatten)]
    pub provenance: Provenance,
    pub status: ListingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<ApprovalStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<ActionType>,
    #[serde(flatten)]
    pub audit: AuditTrail,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ListingRecord {
    pub fn new(content: ListingContent, provenance: Provenance, status: ListingStatus) -> Self {
        Self {
            id: String::new(),
            content,
            provenance,
            status,
            approval_status: None,
            original_id: None,
            action_type: None,
            audit: AuditTrail::default(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Whether this record is a pending edit of another listing.
    pub fn is_update_request(&self) -> bool {
        self.action_type == Some(ActionType::Update) && self.original_id.is_some()
    }

    pub fn is_submitted_by(&self, actor: &Actor) -> bool {
        actor.is_submitter(&self.provenance.submitter_id, &self.provenance.submitter_email)
    }

    pub fn from_document(document: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(document))
    }

    /// Serializes into a store document. Store-managed keys (`id`,
    /// `createdAt`, `updatedAt`) are left for the store to assign.
    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        let mut document = match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(serde::ser::Error::custom(format!(
                    "listing serialized to non-object value: {other}"
                )))
            }
        };
        for key in ["id", "createdAt", "updatedAt"] {
            document.remove(key);
        }
        Ok(document)
    }
}

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::schedule::{Day, DaySchedule};
    use serde_json::json;

    fn sample_document() -> serde_json::Value {
        json!({
            "id": "-Nabc",
            "nama": "Tambal Ban Pak Joko",
            "alamat": "Jl. Merdeka 10",
            "telepon": "08123",
            "latitude": "-6.2",
            "longitude": "106.8",
            "gambar_1": "https://img.example/1.jpg",
            "gambar_2": "",
            "hari_senin": "Buka 24 Jam",
            "hari_selasa_buka": "08:00",
            "hari_selasa_tutup": "17:00",
            "ditambahkan_oleh": "Joko",
            "email_penambah": "joko@example.com",
            "uid_penambah": "u1",
            "role_penambah": "pengguna",
            "status": "pending_deletion",
            "deletion_reason": "closed down",
            "deletion_requested_at": null,
            "createdAt": "2025-01-02T03:04:05Z"
        })
    }

    #[test]
    fn test_reads_legacy_document_shape() {
        let record: ListingRecord = serde_json::from_value(sample_document()).unwrap();

        assert_eq!(record.id, "-Nabc");
        assert_eq!(record.content.name, "Tambal Ban Pak Joko");
        assert_eq!(record.content.photo_primary.as_deref(), Some("https://img.example/1.jpg"));
        assert_eq!(record.content.photo_secondary, None);
        assert_eq!(record.content.schedule.get(Day::Senin), DaySchedule::OpenAllDay);
        assert_eq!(record.content.schedule.describe(Day::Selasa), "08:00 - 17:00");
        assert_eq!(record.provenance.submitter_role, Some(Role::User));
        assert_eq!(record.status, ListingStatus::PendingDeletion);
        assert_eq!(record.audit.deletion_reason.as_deref(), Some("closed down"));
        assert!(record.audit.deletion_requested_at.is_none());
        assert!(record.created_at.is_some());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let mut document = sample_document();
        document["status"] = json!("archived");
        assert!(serde_json::from_value::<ListingRecord>(document).is_err());
    }

    #[test]
    fn test_to_document_leaves_store_keys_out() {
        let record: ListingRecord = serde_json::from_value(sample_document()).unwrap();
        let document = record.to_document().unwrap();

        assert!(!document.contains_key("id"));
        assert!(!document.contains_key("createdAt"));
        assert_eq!(document.get("hari_senin"), Some(&json!("Buka 24 Jam")));
        assert_eq!(document.get("status"), Some(&json!("pending_deletion")));
        assert!(!document.contains_key("gambar_2"));
        assert!(!document.contains_key("approved_by"));
    }

    #[test]
    fn test_content_patch_nulls_unset_optional_keys() {
        let record: ListingRecord = serde_json::from_value(sample_document()).unwrap();
        let patch = record.content.to_patch().unwrap();

        assert_eq!(patch.get("gambar_1"), Some(&json!("https://img.example/1.jpg")));
        assert_eq!(patch.get("gambar_2"), Some(&serde_json::Value::Null));
        assert_eq!(patch.get("hari_senin"), Some(&json!("Buka 24 Jam")));
        assert_eq!(patch.get("hari_rabu_buka"), Some(&serde_json::Value::Null));
        assert!(!patch.contains_key("status"));
    }

    #[test]
    fn test_contributor_key_falls_back_to_email_then_name() {
        let mut provenance = Provenance {
            submitter_name: "Joko".to_string(),
            submitter_email: "joko@example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(provenance.contributor_key(), "joko@example.com");
        provenance.submitter_email.clear();
        assert_eq!(provenance.contributor_key(), "Joko");
        provenance.submitter_id = "u9".to_string();
        assert_eq!(provenance.contributor_key(), "u9");
    }

    #[test]
    fn test_audit_merge_only_overwrites_set_fields() {
        let mut audit = AuditTrail {
            approved_by: Some("A".to_string()),
            deletion_reason: Some("dup".to_string()),
            ..Default::default()
        };
        audit.merge(&AuditTrail {
            rejected_by: Some("B".to_string()),
            ..Default::default()
        });
        assert_eq!(audit.approved_by.as_deref(), Some("A"));
        assert_eq!(audit.rejected_by.as_deref(), Some("B"));

        for field in AuditField::DELETION_REQUEST {
            audit.clear(field);
        }
        assert!(audit.deletion_reason.is_none());
    }
}
