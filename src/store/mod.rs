//! Persistence collaborators for listing documents.
//!
//! A store owns durable state. It assigns `id` on create and stamps
//! `createdAt`/`updatedAt` itself, so callers never send those keys.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::listing::Document;

pub mod json_file;
pub mod memory;
#[cfg(feature = "database")]
pub mod sqlite;

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;
#[cfg(feature = "database")]
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document not found: {id}")]
    NotFound { id: String },

    #[error("Lock acquisition failed: {reason}")]
    Lock { reason: String },

    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound { id: id.into() }
    }
}

/// Flat collection of listing documents addressed by id.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persists a new document and returns the id assigned to it.
    async fn create(&self, document: Document) -> Result<String, StoreError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Merges `patch` into the stored document. `null` values remove keys.
    async fn update(&self, id: &str, patch: Document) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Every document, oldest first.
    async fn list_all(&self) -> Result<Vec<Document>, StoreError>;
}

/// Keys only the store may write.
pub const MANAGED_KEYS: [&str; 3] = ["id", "createdAt", "updatedAt"];

pub(crate) fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Prepares a document for its first write.
pub(crate) fn stamp_new(mut document: Document, id: &str, at: DateTime<Utc>) -> Document {
    for key in MANAGED_KEYS {
        document.remove(key);
    }
    document.retain(|_, value| !value.is_null());
    document.insert("id".to_string(), Value::String(id.to_string()));
    document.insert("createdAt".to_string(), timestamp(at));
    document.insert("updatedAt".to_string(), timestamp(at));
    document
}

/// Shallow merge of `patch` into `target`; `null` removes the key.
pub(crate) fn merge_patch(target: &mut Document, patch: Document, at: DateTime<Utc>) {
    for (key, value) in patch {
        if MANAGED_KEYS.contains(&key.as_str()) {
            continue;
        }
        if value.is_null() {
            target.remove(&key);
        } else {
            target.insert(key, value);
        }
    }
    target.insert("updatedAt".to_string(), timestamp(at));
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_merge_patch_removes_null_keys_and_keeps_identity() {
        let at = Utc::now();
        let mut target = stamp_new(
            doc(json!({"nama": "A", "deletion_reason": "dup", "id": "forged"})),
            "id-1",
            at,
        );
        assert_eq!(target.get("id"), Some(&json!("id-1")));

        merge_patch(
            &mut target,
            doc(json!({"deletion_reason": null, "status": "aktif", "id": "other"})),
            at,
        );

        assert!(!target.contains_key("deletion_reason"));
        assert_eq!(target.get("status"), Some(&json!("aktif")));
        assert_eq!(target.get("id"), Some(&json!("id-1")));
        assert_eq!(target.get("nama"), Some(&json!("A")));
    }
}
