// Netris Library - tambal ban listing workflow
// This exposes the core components for testing and integration

pub mod actor;
pub mod cli;
pub mod config;
pub mod identity;
pub mod listing;
pub mod media;
pub mod report;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use actor::{Actor, Role};
pub use config::{config, init_config, NetrisConfig};
pub use identity::{IdentityProvider, StaticIdentity};
pub use listing::{Disposition, ListingDraft, ListingRecord, ListingStatus};
pub use media::{DirectoryMediaHost, MediaError, MediaHost};
pub use report::{ContributorReport, ReportPeriod};
pub use service::{DeletionOutcome, ListingService, PendingQueue, SearchFilter, UpdateOutcome};
pub use store::{InMemoryStore, JsonFileStore, RecordStore, StoreError};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use workflow::{WorkflowAction, WorkflowEngine, WorkflowError};
