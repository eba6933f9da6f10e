use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statig::prelude::*;
use std::fmt;
use tracing::{info, warn};

use super::action::WorkflowAction;
use super::errors::WorkflowError;
use crate::listing::{Disposition, ListingStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    SubmitForReview,
    Publish,
    Approve,
    Reject,
    RequestDeletion,
    ApproveDeletion,
    RejectDeletion,
    Remove,
}

/// Where a listing stands after replaying its journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePosition {
    #[default]
    Draft,
    Pending,
    Aktif,
    Rejected,
    PendingDeletion,
    Deleted,
}

impl LifecyclePosition {
    /// Stored outcome; `None` before the first persist.
    pub fn disposition(self) -> Option<Disposition> {
        match self {
            LifecyclePosition::Draft => None,
            LifecyclePosition::Pending => Some(Disposition::Stored(ListingStatus::Pending)),
            LifecyclePosition::Aktif => Some(Disposition::Stored(ListingStatus::Aktif)),
            LifecyclePosition::Rejected => Some(Disposition::Stored(ListingStatus::Rejected)),
            LifecyclePosition::PendingDeletion => {
                Some(Disposition::Stored(ListingStatus::PendingDeletion))
            }
            LifecyclePosition::Deleted => Some(Disposition::Deleted),
        }
    }
}

impl fmt::Display for LifecyclePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.disposition() {
            Some(disposition) => disposition.fmt(f),
            None => f.write_str("draft"),
        }
    }
}

/// Journal entry written whenever a listing's status or existence changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub listing_id: String,
    pub action: WorkflowAction,
    pub event: LifecycleEvent,
    pub from: Option<ListingStatus>,
    pub to: Disposition,
    pub actor_id: String,
    pub actor_name: String,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: String,
}

impl TransitionRecord {
    pub fn log(&self) {
        info!(
            listing_id = %self.listing_id,
            action = %self.action,
            event = ?self.event,
            from = ?self.from,
            to = %self.to,
            actor_id = %self.actor_id,
            correlation_id = %self.correlation_id,
            "Listing state transition"
        );
    }
}

/// Legal transition graph of a single listing, driven by journal events.
#[derive(Debug, Default)]
pub struct ListingLifecycle {
    listing_id: String,
    position: LifecyclePosition,
    refused: Option<LifecycleEvent>,
}

impl ListingLifecycle {
    pub fn new(listing_id: impl Into<String>) -> Self {
        Self {
            listing_id: listing_id.into(),
            ..Default::default()
        }
    }

    pub fn listing_id(&self) -> &str {
        &self.listing_id
    }

    pub fn position(&self) -> LifecyclePosition {
        self.position
    }

    /// Last event the current state did not accept.
    pub fn refused(&self) -> Option<LifecycleEvent> {
        self.refused
    }

    fn advance(&mut self, to: LifecyclePosition) {
        self.position = to;
        self.refused = None;
    }

    fn refuse(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        warn!(
            listing_id = %self.listing_id,
            event = ?event,
            position = %self.position,
            "Lifecycle refused event"
        );
        self.refused = Some(*event);
        Handled
    }
}

#[state_machine(initial = "State::draft()")]
impl ListingLifecycle {
    #[state]
    fn draft(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::SubmitForReview => {
                self.advance(LifecyclePosition::Pending);
                Transition(State::pending())
            }
            LifecycleEvent::Publish => {
                self.advance(LifecyclePosition::Aktif);
                Transition(State::aktif())
            }
            _ => self.refuse(event),
        }
    }

    #[state]
    fn pending(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::Approve => {
                self.advance(LifecyclePosition::Aktif);
                Transition(State::aktif())
            }
            LifecycleEvent::Reject => {
                self.advance(LifecyclePosition::Rejected);
                Transition(State::rejected())
            }
            LifecycleEvent::Remove => {
                self.advance(LifecyclePosition::Deleted);
                Transition(State::deleted())
            }
            _ => self.refuse(event),
        }
    }

    #[state]
    fn aktif(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::RequestDeletion => {
                self.advance(LifecyclePosition::PendingDeletion);
                Transition(State::pending_deletion())
            }
            LifecycleEvent::Remove => {
                self.advance(LifecyclePosition::Deleted);
                Transition(State::deleted())
            }
            _ => self.refuse(event),
        }
    }

    #[state]
    fn pending_deletion(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::ApproveDeletion | LifecycleEvent::Remove => {
                self.advance(LifecyclePosition::Deleted);
                Transition(State::deleted())
            }
            LifecycleEvent::RejectDeletion => {
                self.advance(LifecyclePosition::Aktif);
                Transition(State::aktif())
            }
            _ => self.refuse(event),
        }
    }

    #[state]
    fn rejected(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        match event {
            LifecycleEvent::Remove => {
                self.advance(LifecyclePosition::Deleted);
                Transition(State::deleted())
            }
            _ => self.refuse(event),
        }
    }

    #[state]
    fn deleted(&mut self, event: &LifecycleEvent) -> Outcome<State> {
        self.refuse(event)
    }
}

/// Replays a listing's journal and returns where it ends up.
///
/// Fails on the first event the lifecycle refuses, and on entries whose
/// recorded outcome disagrees with the lifecycle.
pub fn replay(
    listing_id: &str,
    history: &[TransitionRecord],
) -> Result<LifecyclePosition, WorkflowError> {
    let mut machine = ListingLifecycle::new(listing_id).state_machine();

    for entry in history.iter().filter(|e| e.listing_id == listing_id) {
        let before = machine.inner().position();
        machine.handle(&entry.event);

        let lifecycle = machine.inner();
        let diverged = lifecycle.position().disposition() != Some(entry.to);
        if lifecycle.refused().is_some() || diverged {
            return Err(WorkflowError::HistoryInconsistent {
                listing_id: listing_id.to_string(),
                event: entry.event,
                position: before.to_string(),
            });
        }
    }

    Ok(machine.inner().position())
}
