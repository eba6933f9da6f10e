use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload rejected: {reason}")]
    Rejected { reason: String },
}

/// Accepts raw image bytes and hands back a URL the listing can reference.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, MediaError>;
}

/// Writes uploads into a local directory under generated names.
#[derive(Debug, Clone)]
pub struct DirectoryMediaHost {
    root: PathBuf,
    base_url: String,
}

impl DirectoryMediaHost {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

fn extension(file_name: &str) -> &str {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("jpg")
}

#[async_trait]
impl MediaHost for DirectoryMediaHost {
    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::Rejected {
                reason: format!("'{file_name}' is empty"),
            });
        }

        let stored_name = format!(
            "{}.{}",
            uuid::Uuid::new_v4().simple(),
            extension(file_name).to_ascii_lowercase()
        );
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&stored_name), bytes).await?;

        let url = format!("{}/{}", self.base_url, stored_name);
        info!(file_name = %file_name, size = bytes.len(), url = %url, "Stored uploaded photo");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let host = DirectoryMediaHost::new(dir.path(), "https://cdn.example/netris/");

        let url = host.upload("Bengkel.PNG", b"\x89PNG").await.unwrap();
        assert!(url.starts_with("https://cdn.example/netris/"));
        assert!(url.ends_with(".png"));

        let stored = url.rsplit('/').next().unwrap();
        assert_eq!(std::fs::read(dir.path().join(stored)).unwrap(), b"\x89PNG");
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let host = DirectoryMediaHost::new(dir.path(), "file://media");
        assert!(matches!(
            host.upload("empty.jpg", &[]).await,
            Err(MediaError::Rejected { .. })
        ));
    }
}
