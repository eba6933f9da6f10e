use anyhow::Result;

use super::{print_listing_line, with_listing_service, Command};
use crate::identity::{IdentityProvider, StaticIdentity};
use crate::service::DeletionOutcome;

pub struct QueueCommand;

impl Command for QueueCommand {
    async fn execute(&self) -> Result<()> {
        with_listing_service(|service| async move {
            let queue = service.pending_queue().await?;
            if queue.is_empty() {
                println!("🎉 Nothing waiting for review");
                return Ok(());
            }

            let sections = [
                ("🆕 New submissions", &queue.submissions),
                ("✏️  Edit requests", &queue.update_requests),
                ("🗑️  Deletion requests", &queue.deletion_requests),
            ];
            for (title, records) in sections {
                if records.is_empty() {
                    continue;
                }
                println!("{title} ({}):", records.len());
                for record in records {
                    print_listing_line(record);
                    if let Some(reason) = &record.audit.deletion_reason {
                        println!("      💬 {reason}");
                    }
                }
                println!();
            }
            Ok(())
        })
        .await
    }
}

/// Admin decision on a queued listing.
pub enum ReviewDecision {
    Approve,
    Reject { reason: String },
    ApproveDeletion,
    RejectDeletion { reason: String },
}

pub struct ReviewCommand {
    pub identity: StaticIdentity,
    pub id: String,
    pub decision: ReviewDecision,
}

impl Command for ReviewCommand {
    async fn execute(&self) -> Result<()> {
        let actor = self.identity.current_actor().await;
        let id = self.id.as_str();

        with_listing_service(|service| async move {
            match &self.decision {
                ReviewDecision::Approve => {
                    let record = service.approve(&actor, id).await?;
                    println!("✅ {} is now published ({})", record.content.name, record.id);
                }
                ReviewDecision::Reject { reason } => {
                    service.reject(&actor, id, reason).await?;
                    println!("❌ {id} rejected");
                }
                ReviewDecision::ApproveDeletion => {
                    service.approve_deletion(&actor, id).await?;
                    println!("🗑️  {id} removed");
                }
                ReviewDecision::RejectDeletion { reason } => {
                    service.reject_deletion(&actor, id, reason).await?;
                    println!("↩️  Deletion of {id} refused, listing stays published");
                }
            }
            Ok(())
        })
        .await
    }
}

pub struct RequestDeletionCommand {
    pub identity: StaticIdentity,
    pub id: String,
    pub reason: String,
}

impl Command for RequestDeletionCommand {
    async fn execute(&self) -> Result<()> {
        let actor = self.identity.current_actor().await;

        with_listing_service(|service| async move {
            match service.request_deletion(&actor, &self.id, &self.reason).await? {
                DeletionOutcome::Removed { listing_id } => {
                    println!("🗑️  {listing_id} removed");
                }
                DeletionOutcome::Requested(record) => {
                    println!("📨 Deletion of {} requested, waiting for admin review", record.id);
                }
            }
            Ok(())
        })
        .await
    }
}
