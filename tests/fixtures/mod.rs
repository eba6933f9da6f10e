#![allow(dead_code)]
/// Shared actors, drafts and service wiring for integration tests
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};

use netris::config::ListingDefaults;
use netris::listing::{Day, DayInput, Document, ListingDraft};
use netris::media::{MediaError, MediaHost};
use netris::store::InMemoryStore;
use netris::workflow::{FixedClock, WorkflowEngine};
use netris::{Actor, ListingService, Role};

/// Legacy listing document as the mobile app stored it
pub fn legacy_listing_document() -> Document {
    let json_data = include_str!("legacy_listing.json");
    serde_json::from_str(json_data).expect("Failed to parse legacy listing fixture")
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 11, 10, 0, 0).unwrap()
}

pub fn fixed_engine() -> WorkflowEngine {
    WorkflowEngine::with_clock(Arc::new(FixedClock(fixed_now())))
}

pub fn owner() -> Actor {
    Actor::new("u1", "budi@example.com", "Budi", Role::User)
}

pub fn other_user() -> Actor {
    Actor::new("u2", "sari@example.com", "Sari", Role::User)
}

pub fn admin() -> Actor {
    Actor::new("a1", "admin@example.com", "A", Role::Admin)
}

pub fn superadmin() -> Actor {
    Actor::new("s1", "root@example.com", "Super", Role::Superadmin)
}

pub fn draft(name: &str) -> ListingDraft {
    let mut draft = ListingDraft::new(name, "Jl. Merdeka 10, Bandung", "-6.914744", "107.609810");
    draft.phone = "0812-3456-7890".to_string();
    draft.schedule.insert(
        Day::Senin,
        DayInput {
            open: "07:00".to_string(),
            close: "17:00".to_string(),
            ..Default::default()
        },
    );
    draft
}

/// Media host that records uploads instead of storing them
#[derive(Debug, Default)]
pub struct RecordingMediaHost {
    pub uploads: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaHost for RecordingMediaHost {
    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::Rejected {
                reason: "empty".to_string(),
            });
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(file_name.to_string());
        Ok(format!("https://media.test/{}/{}", uploads.len(), file_name))
    }
}

pub struct TestHarness {
    pub store: Arc<InMemoryStore>,
    pub media: Arc<RecordingMediaHost>,
    pub service: ListingService,
}

pub fn harness() -> TestHarness {
    let store = Arc::new(InMemoryStore::new());
    let media = Arc::new(RecordingMediaHost::default());
    let service = ListingService::new(
        store.clone(),
        media.clone(),
        fixed_engine(),
        ListingDefaults::default(),
    );
    TestHarness {
        store,
        media,
        service,
    }
}
