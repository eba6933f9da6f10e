use anyhow::Result;

use super::{print_listing_detail, print_listing_line, with_listing_service, Command};
use crate::identity::{IdentityProvider, StaticIdentity};
use crate::listing::ListingStatus;
use crate::service::SearchFilter;

pub struct ListCommand {
    pub identity: StaticIdentity,
    pub status: Option<ListingStatus>,
    pub query: Option<String>,
    pub mine: bool,
}

impl Command for ListCommand {
    async fn execute(&self) -> Result<()> {
        let actor = self.identity.current_actor().await;
        if self.mine && actor.id.is_empty() && actor.email.is_empty() {
            anyhow::bail!("--mine needs --actor-id or --actor-email");
        }

        let filter = SearchFilter {
            query: self.query.clone(),
            // non-admins browse published listings unless looking at their own
            status: self.status.or((!actor.is_privileged() && !self.mine).then_some(ListingStatus::Aktif)),
            submitted_by: self.mine.then_some(actor),
        };

        with_listing_service(|service| async move {
            let listings = service.search(&filter).await?;
            if listings.is_empty() {
                println!("📋 No listings found");
                return Ok(());
            }
            println!("📋 {} listing(s):", listings.len());
            for record in &listings {
                print_listing_line(record);
            }
            Ok(())
        })
        .await
    }
}

pub struct ShowCommand {
    pub id: String,
}

impl Command for ShowCommand {
    async fn execute(&self) -> Result<()> {
        with_listing_service(|service| async move {
            match service.get(&self.id).await? {
                Some(record) => print_listing_detail(&record),
                None => println!("❌ No listing with id {}", self.id),
            }
            Ok(())
        })
        .await
    }
}
