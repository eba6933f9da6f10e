use anyhow::Result;
use std::sync::Arc;

use crate::config::{NetrisConfig, StoreBackend};
use crate::listing::{Day, ListingRecord};
use crate::media::DirectoryMediaHost;
use crate::service::ListingService;
use crate::store::{InMemoryStore, JsonFileStore, RecordStore};
use crate::workflow::WorkflowEngine;

pub mod browse;
pub mod review;
pub mod stats;
pub mod submit;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Builds the service described by `config`.
pub async fn build_service(config: &NetrisConfig) -> Result<ListingService> {
    let store: Arc<dyn RecordStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(InMemoryStore::new()),
        StoreBackend::Json => Arc::new(JsonFileStore::new(&config.store.path)),
        #[cfg(feature = "database")]
        StoreBackend::Sqlite => Arc::new(crate::store::SqliteStore::connect(&config.store.path).await?),
        #[cfg(not(feature = "database"))]
        StoreBackend::Sqlite => {
            anyhow::bail!("The sqlite store needs netris built with the `database` feature")
        }
    };
    let media = Arc::new(DirectoryMediaHost::new(
        &config.media.directory,
        config.media.base_url.clone(),
    ));

    Ok(ListingService::new(
        store,
        media,
        WorkflowEngine::new(),
        config.listings.clone(),
    ))
}

pub async fn with_listing_service<F, Fut, R>(f: F) -> Result<R>
where
    F: FnOnce(ListingService) -> Fut,
    Fut: std::future::Future<Output = Result<R>>,
{
    let config = crate::config::config()?;
    let service = build_service(config).await?;
    f(service).await
}

pub async fn show_how_to_get_started() -> Result<()> {
    println!("🛞 Netris - tambal ban directory");
    println!();
    println!("Browse:");
    println!("  🗺️  netris list                 # Published listings");
    println!("  🔎 netris list -q <text>       # Search by name, address or phone");
    println!("  📄 netris show <id>            # One listing in full");
    println!();
    println!("Contribute (pass --actor-id/--actor-email):");
    println!("  ➕ netris submit --file draft.json --photo front.jpg");
    println!("  ✏️  netris edit <id> --file draft.json");
    println!("  🗑️  netris request-deletion <id> --reason '...'");
    println!();
    println!("Admin commands (--role admin):");
    println!("  📋 netris queue                # Everything waiting for review");
    println!("  ✅ netris approve <id>");
    println!("  ❌ netris reject <id> --reason '...'");
    println!("  📊 netris stats / netris report --period month");
    Ok(())
}

pub(crate) fn print_listing_line(record: &ListingRecord) {
    let marker = if record.is_update_request() { " (edit)" } else { "" };
    println!(
        "  [{}] {} - {}{}",
        record.status, record.id, record.content.name, marker
    );
    println!("      📍 {}", record.content.address);
}

pub(crate) fn print_listing_detail(record: &ListingRecord) {
    let content = &record.content;
    println!("📄 {} ({})", content.name, record.id);
    println!("   Status: {}", record.status);
    println!("   Address: {}", content.address);
    println!("   Phone: {}", content.phone);
    println!("   Location: {}, {}", content.latitude, content.longitude);
    if let Some(days) = &content.operating_days {
        println!("   Days: {days}");
    }
    if let Some(hours) = &content.operating_hours {
        println!("   Hours: {hours}");
    }
    if !content.schedule.is_empty() {
        println!("   Schedule:");
        for day in Day::ALL {
            println!("     {:<7} {}", day.to_string(), content.schedule.describe(day));
        }
    }
    for url in content.photos() {
        println!("   Photo: {url}");
    }
    if let Some(original) = &record.original_id {
        println!("   Edit of: {original}");
    }

    let provenance = &record.provenance;
    println!(
        "   Added by: {} <{}>",
        provenance.submitter_name, provenance.submitter_email
    );
    if let Some(at) = provenance.submitted_at {
        println!("   Added at: {}", at.format("%Y-%m-%d %H:%M"));
    }

    let audit = &record.audit;
    if let Some(by) = &audit.approved_by {
        println!("   Approved by: {by}");
    }
    if let (Some(by), Some(reason)) = (&audit.rejected_by, &audit.rejection_reason) {
        println!("   Rejected by {by}: {reason}");
    }
    if let Some(reason) = &audit.deletion_reason {
        println!(
            "   Deletion requested by {}: {reason}",
            audit.deletion_requested_by.as_deref().unwrap_or("?")
        );
    }
    if let (Some(by), Some(reason)) = (&audit.deletion_rejected_by, &audit.deletion_rejection_reason) {
        println!("   Deletion refused by {by}: {reason}");
    }
}
