use async_trait::async_trait;
use chrono::Utc;
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{merge_patch, new_id, stamp_new, RecordStore, StoreError};
use crate::listing::Document;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    listings: Vec<Document>,
}

/// Keeps every listing in one JSON file.
///
/// Each call holds an exclusive `fd-lock` on `<file>.lock` for its whole
/// read-modify-write, so separate processes sharing the file never interleave
/// writes. The file is replaced through a temp file and rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Runs `op` on the snapshot under the file lock, writing back when it returns `true`.
    async fn with_snapshot<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Snapshot) -> Result<(T, bool), StoreError> + Send + 'static,
    {
        let path = self.path.clone();
        let lock_path = self.lock_path();

        tokio::task::spawn_blocking(move || -> Result<T, StoreError> {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let lock_file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)?;
            let mut lock = RwLock::new(lock_file);
            let _guard = lock.write().map_err(|e| StoreError::Lock {
                reason: format!("{}: {e}", lock_path.display()),
            })?;

            let mut snapshot = read_snapshot(&path)?;
            let (value, dirty) = op(&mut snapshot)?;
            if dirty {
                write_snapshot(&path, &snapshot)?;
            }
            Ok(value)
        })
        .await
        .map_err(|e| StoreError::Unavailable {
            reason: format!("store task failed: {e}"),
        })?
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
    match fs::read(path) {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Snapshot::default()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Snapshot::default()),
        Err(e) => Err(e.into()),
    }
}

fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let file = File::create(&tmp_path)?;
    serde_json::to_writer_pretty(&file, snapshot)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn position(snapshot: &Snapshot, id: &str) -> Option<usize> {
    snapshot
        .listings
        .iter()
        .position(|d| d.get("id").and_then(|v| v.as_str()) == Some(id))
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn create(&self, document: Document) -> Result<String, StoreError> {
        let id = new_id();
        let document = stamp_new(document, &id, Utc::now());
        let created = id.clone();

        self.with_snapshot(move |snapshot| {
            snapshot.listings.push(document);
            Ok(((), true))
        })
        .await?;

        info!(id = %created, path = %self.path.display(), "Created listing document");
        Ok(created)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let id = id.to_string();
        self.with_snapshot(move |snapshot| {
            let found = position(snapshot, &id).map(|i| snapshot.listings[i].clone());
            Ok((found, false))
        })
        .await
    }

    async fn update(&self, id: &str, patch: Document) -> Result<(), StoreError> {
        let id = id.to_string();
        self.with_snapshot(move |snapshot| {
            let index = position(snapshot, &id).ok_or_else(|| StoreError::not_found(&id))?;
            merge_patch(&mut snapshot.listings[index], patch, Utc::now());
            debug!(id = %id, "Updated listing document");
            Ok(((), true))
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        self.with_snapshot(move |snapshot| {
            let index = position(snapshot, &id).ok_or_else(|| StoreError::not_found(&id))?;
            snapshot.listings.remove(index);
            debug!(id = %id, "Deleted listing document");
            Ok(((), true))
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<Document>, StoreError> {
        self.with_snapshot(|snapshot| Ok((std::mem::take(&mut snapshot.listings), false)))
            .await
    }
}
