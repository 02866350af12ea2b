//! Document store adapter.
//!
//! Every collection holds flat JSON documents. The store assigns an opaque `key`
//! on insert and embeds it in the stored document, so a document read back from
//! any operation always carries its own key.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A stored document: a flat JSON object.
pub type Document = Map<String, Value>;

/// Field name under which the store keeps a document's key.
pub const KEY_FIELD: &str = "key";

/// Errors surfaced by any store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new document and return it with its assigned key.
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError>;

    /// All documents whose fields equal every field of `query`.
    /// Ordering is unspecified.
    async fn fetch(&self, collection: &str, query: &Document) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError>;

    /// Replace the document stored under `key`. Fails with `NotFound` if absent.
    async fn update(&self, collection: &str, key: &str, doc: Document) -> Result<Document, StoreError>;

    /// Remove the document under `key`. Removing a missing key is not an error.
    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError>;

    /// Connectivity check used by the health endpoint
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Fresh store key (UUID v4, simple form)
pub fn new_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Collection names end up quoted into SQL by the Postgres backend, so only
/// lowercase ASCII letters, digits and underscores are accepted, starting with a letter.
pub fn validate_collection(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && name.len() <= 63;

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(name.to_string()))
    }
}

/// True when every field in `query` is present in `doc` with an equal value
pub(crate) fn matches_query(doc: &Document, query: &Document) -> bool {
    query.iter().all(|(field, expected)| doc.get(field) == Some(expected))
}
