pub mod action;
pub mod engine;
pub mod errors;
pub mod lifecycle;

pub use action::WorkflowAction;
pub use engine::{
    can_delete, can_edit, Clock, DeletionDecision, FixedClock, RemovalSignal, StatusFields,
    SystemClock, UpdateDecision, WorkflowEngine,
};
pub use errors::WorkflowError;
pub use lifecycle::{
    replay, LifecycleEvent, LifecyclePosition, ListingLifecycle, TransitionRecord,
};
