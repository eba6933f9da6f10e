use serde::{Deserialize, Serialize};
use std::fmt;

/// Every action an actor can attempt against a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Create,
    Update,
    Delete,
    Approve,
    Reject,
    RequestDeletion,
    ApproveDeletion,
    RejectDeletion,
}

impl WorkflowAction {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowAction::Create => "create",
            WorkflowAction::Update => "update",
            WorkflowAction::Delete => "delete",
            WorkflowAction::Approve => "approve",
            WorkflowAction::Reject => "reject",
            WorkflowAction::RequestDeletion => "request_deletion",
            WorkflowAction::ApproveDeletion => "approve_deletion",
            WorkflowAction::RejectDeletion => "reject_deletion",
        }
    }

    /// Actions reserved for admins and superadmins.
    pub fn requires_privilege(self) -> bool {
        matches!(
            self,
            WorkflowAction::Approve
                | WorkflowAction::Reject
                | WorkflowAction::ApproveDeletion
                | WorkflowAction::RejectDeletion
        )
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
