use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{matches_query, new_key, validate_collection, Document, DocumentStore, StoreError, KEY_FIELD};

/// In-process document store. Collections are created on first write.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, mut doc: Document) -> Result<Document, StoreError> {
        validate_collection(collection)?;

        let key = new_key();
        doc.insert(KEY_FIELD.to_string(), Value::String(key.clone()));

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(key, doc.clone());

        Ok(doc)
    }

    async fn fetch(&self, collection: &str, query: &Document) -> Result<Vec<Document>, StoreError> {
        validate_collection(collection)?;

        let collections = self.collections.read().await;
        let items = collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| matches_query(doc, query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(items)
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        validate_collection(collection)?;

        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| docs.get(key)).cloned())
    }

    async fn update(&self, collection: &str, key: &str, mut doc: Document) -> Result<Document, StoreError> {
        validate_collection(collection)?;

        let mut collections = self.collections.write().await;
        let slot = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(key))
            .ok_or_else(|| StoreError::NotFound(format!("key '{}' in '{}'", key, collection)))?;

        doc.insert(KEY_FIELD.to_string(), Value::String(key.to_string()));
        *slot = doc.clone();

        Ok(doc)
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        validate_collection(collection)?;

        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(key);
        }
        Ok(())
    }
}
