use thiserror::Error;

use super::action::WorkflowAction;
use super::lifecycle::LifecycleEvent;
use crate::actor::Role;
use crate::listing::ListingStatus;
use crate::media::MediaError;
use crate::store::StoreError;

/// Errors surfaced by the workflow engine and the listing service.
///
/// Nothing in the workflow retries or swallows these; callers decide what to
/// show the user.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error("Invalid transition: cannot {action} a listing in status '{from}'")]
    InvalidTransition {
        from: ListingStatus,
        action: WorkflowAction,
    },

    #[error("Permission denied: {actor} ({role}) may not {action} this listing")]
    PermissionDenied {
        actor: String,
        role: Role,
        action: WorkflowAction,
    },

    #[error("Listing not found: {id}")]
    NotFound { id: String },

    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),

    #[error("Media upload failed: {0}")]
    Media(#[from] MediaError),

    #[error("Transition history of {listing_id} is inconsistent: {event:?} not allowed after {position}")]
    HistoryInconsistent {
        listing_id: String,
        event: LifecycleEvent,
        position: String,
    },
}

impl WorkflowError {
    pub fn validation(reason: impl Into<String>) -> Self {
        WorkflowError::Validation {
            reason: reason.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        WorkflowError::NotFound { id: id.into() }
    }

    /// Whether the failure came from the store or media host rather than the request itself.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, WorkflowError::Persistence(_) | WorkflowError::Media(_))
    }
}

impl From<serde_json::Error> for WorkflowError {
    fn from(err: serde_json::Error) -> Self {
        WorkflowError::Persistence(StoreError::Serialization(err))
    }
}
