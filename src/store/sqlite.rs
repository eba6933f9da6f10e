use async_trait::async_trait;
use chrono::Utc;
use sqlx::{migrate::MigrateDatabase, Row, SqlitePool};
use tracing::info;

use super::{merge_patch, new_id, stamp_new, RecordStore, StoreError};
use crate::listing::Document;

/// Listing documents kept as JSON text in a SQLite table.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database and its listings table.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        if !sqlx::Sqlite::database_exists(database_url).await? {
            info!("Creating database at {}", database_url);
            sqlx::Sqlite::create_database(database_url).await?;
        }

        let pool = SqlitePool::connect(database_url).await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listings (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                document TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

fn decode(text: &str) -> Result<Document, StoreError> {
    Ok(serde_json::from_str(text)?)
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn create(&self, document: Document) -> Result<String, StoreError> {
        let id = new_id();
        let document = stamp_new(document, &id, Utc::now());

        sqlx::query("INSERT INTO listings (id, document) VALUES (?1, ?2)")
            .bind(&id)
            .bind(serde_json::to_string(&document)?)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query("SELECT document FROM listings WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| decode(row.get::<&str, _>("document")))
            .transpose()
    }

    async fn update(&self, id: &str, patch: Document) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query("SELECT document FROM listings WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::not_found(id))?;

        let mut document = decode(row.get::<&str, _>("document"))?;
        merge_patch(&mut document, patch, Utc::now());

        sqlx::query("UPDATE listings SET document = ?1 WHERE id = ?2")
            .bind(serde_json::to_string(&document)?)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(id));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query("SELECT document FROM listings ORDER BY seq ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| decode(row.get::<&str, _>("document")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn database_url(dir: &TempDir) -> String {
        format!("sqlite://{}", dir.path().join("netris.db").display())
    }

    fn doc(name: &str) -> Document {
        let mut document = Document::new();
        document.insert("nama".to_string(), json!(name));
        document.insert("alamat".to_string(), json!("Jl. Dago 12"));
        document
    }

    #[tokio::test]
    async fn test_connect_creates_missing_database() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::connect(&database_url(&dir)).await.unwrap();

        assert!(dir.path().join("netris.db").exists());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_documents_survive_reconnect() {
        let dir = TempDir::new().unwrap();
        let id = SqliteStore::connect(&database_url(&dir))
            .await
            .unwrap()
            .create(doc("Tambal Dago"))
            .await
            .unwrap();

        let reopened = SqliteStore::connect(&database_url(&dir)).await.unwrap();
        let document = reopened.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(document["id"], json!(id));
        assert_eq!(document["nama"], json!("Tambal Dago"));
        assert!(document["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_update_merges_and_null_removes_keys() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::connect(&database_url(&dir)).await.unwrap();
        let id = store.create(doc("Tambal Dago")).await.unwrap();

        let mut patch = Document::new();
        patch.insert("nama".to_string(), json!("Tambal Dago Atas"));
        patch.insert("alamat".to_string(), Value::Null);
        patch.insert("id".to_string(), json!("forged"));
        store.update(&id, patch).await.unwrap();

        let stored = store.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored["nama"], json!("Tambal Dago Atas"));
        assert!(!stored.contains_key("alamat"));
        assert_eq!(stored["id"], json!(id));
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::connect(&database_url(&dir)).await.unwrap();

        assert!(matches!(
            store.update("ghost", Document::new()).await,
            Err(StoreError::NotFound { ref id }) if id == "ghost"
        ));
        assert!(matches!(
            store.delete("ghost").await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(store.get_by_id("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_all_follows_insertion_order() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::connect(&database_url(&dir)).await.unwrap();
        let mut ids = Vec::new();
        for name in ["satu", "dua", "tiga"] {
            ids.push(store.create(doc(name)).await.unwrap());
        }

        store.delete(&ids[0]).await.unwrap();
        store.create(doc("empat")).await.unwrap();

        let names: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d["nama"].clone())
            .collect();
        assert_eq!(names, vec![json!("dua"), json!("tiga"), json!("empat")]);
    }
}
