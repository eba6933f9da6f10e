use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::{print_listing_detail, with_listing_service, Command};
use crate::identity::{IdentityProvider, StaticIdentity};
use crate::listing::{ListingDraft, PhotoSource, MAX_PHOTOS};
use crate::service::UpdateOutcome;

fn read_draft(path: &Path) -> Result<ListingDraft> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read draft {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a listing draft", path.display()))
}

fn read_photos(paths: &[PathBuf]) -> Result<Vec<PhotoSource>> {
    if paths.len() > MAX_PHOTOS {
        anyhow::bail!("At most {MAX_PHOTOS} photos can be attached");
    }
    paths
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read photo {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "photo.jpg".to_string());
            Ok(PhotoSource::Upload { file_name, bytes })
        })
        .collect()
}

pub struct SubmitCommand {
    pub identity: StaticIdentity,
    pub file: PathBuf,
    pub photos: Vec<PathBuf>,
}

impl Command for SubmitCommand {
    async fn execute(&self) -> Result<()> {
        let actor = self.identity.current_actor().await;
        let mut draft = read_draft(&self.file)?;
        draft.photos.extend(read_photos(&self.photos)?);

        with_listing_service(|service| async move {
            let record = service.submit(&actor, &draft).await?;
            if record.status.awaits_review() {
                println!("📨 Listing submitted and waiting for admin review");
            } else {
                println!("✅ Listing published");
            }
            println!();
            print_listing_detail(&record);
            Ok(())
        })
        .await
    }
}

pub struct EditCommand {
    pub identity: StaticIdentity,
    pub id: String,
    pub file: PathBuf,
    pub photos: Vec<PathBuf>,
}

impl Command for EditCommand {
    async fn execute(&self) -> Result<()> {
        let actor = self.identity.current_actor().await;
        let mut draft = read_draft(&self.file)?;
        let replacements = read_photos(&self.photos)?;

        with_listing_service(|service| async move {
            if !replacements.is_empty() {
                draft.photos = replacements;
            } else if draft.photos.is_empty() {
                // keep the photos already on the listing
                if let Some(existing) = service.get(&self.id).await? {
                    draft.photos = ListingDraft::from_content(&existing.content).photos;
                }
            }

            match service.update(&actor, &self.id, &draft).await? {
                UpdateOutcome::Applied(record) => {
                    println!("✅ Listing updated");
                    println!();
                    print_listing_detail(&record);
                }
                UpdateOutcome::Submitted(request) => {
                    println!("📨 Edit filed for review as {}", request.id);
                }
            }
            Ok(())
        })
        .await
    }
}
