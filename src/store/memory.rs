use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::{merge_patch, new_id, stamp_new, RecordStore, StoreError};
use crate::listing::Document;

#[derive(Debug, Default)]
struct Collection {
    documents: HashMap<String, Document>,
    order: Vec<String>,
}

/// Process-local store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Collection>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn create(&self, document: Document) -> Result<String, StoreError> {
        let id = new_id();
        let document = stamp_new(document, &id, Utc::now());

        let mut inner = self.inner.write().await;
        inner.documents.insert(id.clone(), document);
        inner.order.push(id.clone());
        debug!(id = %id, "Created document in memory");
        Ok(id)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.inner.read().await.documents.get(id).cloned())
    }

    async fn update(&self, id: &str, patch: Document) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let document = inner
            .documents
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(id))?;
        merge_patch(document, patch, Utc::now());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.documents.remove(id).is_none() {
            return Err(StoreError::not_found(id));
        }
        inner.order.retain(|existing| existing != id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Document>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.documents.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(name: &str) -> Document {
        let mut document = Document::new();
        document.insert("nama".to_string(), json!(name));
        document
    }

    #[tokio::test]
    async fn test_crud_cycle() {
        let store = InMemoryStore::new();
        let first = store.create(doc("A")).await.unwrap();
        let second = store.create(doc("B")).await.unwrap();
        assert_ne!(first, second);

        let stored = store.get_by_id(&first).await.unwrap().unwrap();
        assert_eq!(stored.get("id"), Some(&json!(first)));
        assert!(stored.contains_key("createdAt"));

        let mut patch = Document::new();
        patch.insert("nama".to_string(), json!("A2"));
        store.update(&first, patch).await.unwrap();

        let names: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d["nama"].clone())
            .collect();
        assert_eq!(names, vec![json!("A2"), json!("B")]);

        store.delete(&first).await.unwrap();
        assert!(store.get_by_id(&first).await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_ids_are_reported() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.update("nope", Document::new()).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete("nope").await,
            Err(StoreError::NotFound { .. })
        ));
    }
}
