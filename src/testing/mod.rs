//! Test doubles shared by unit tests across modules.

use async_trait::async_trait;

use crate::auth::Principal;
use crate::store::{Document, DocumentStore, StoreError};

/// A store whose every operation fails as if the backend were down
pub struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert(&self, _collection: &str, _doc: Document) -> Result<Document, StoreError> {
        Err(StoreError::Unavailable("backend offline".to_string()))
    }

    async fn fetch(&self, _collection: &str, _query: &Document) -> Result<Vec<Document>, StoreError> {
        Err(StoreError::Unavailable("backend offline".to_string()))
    }

    async fn get(&self, _collection: &str, _key: &str) -> Result<Option<Document>, StoreError> {
        Err(StoreError::Unavailable("backend offline".to_string()))
    }

    async fn update(&self, _collection: &str, _key: &str, _doc: Document) -> Result<Document, StoreError> {
        Err(StoreError::Unavailable("backend offline".to_string()))
    }

    async fn delete(&self, _collection: &str, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("backend offline".to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("backend offline".to_string()))
    }
}

/// Principal for a username, as the authenticator would resolve it
pub fn principal(username: &str) -> Principal {
    Principal {
        key: format!("{}-key", username),
        username: username.to_string(),
    }
}
