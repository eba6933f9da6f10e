//! Listing data model: the stored record, its weekly schedule, and the draft
//! a submitter fills in.

pub mod draft;
pub mod record;
pub mod schedule;

pub use draft::{ListingDraft, PhotoSource, MAX_PHOTOS};
pub use record::{
    ActionType, ApprovalStatus, AuditField, AuditTrail, Disposition, Document, ListingContent,
    ListingRecord, ListingStatus, Provenance,
};
pub use schedule::{ClockTime, Day, DayInput, DaySchedule, ScheduleError, TimeRange, WeeklySchedule};
