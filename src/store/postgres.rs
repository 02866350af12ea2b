use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{new_key, validate_collection, Document, DocumentStore, StoreError, KEY_FIELD};
use crate::config::StoreConfig;

/// Postgres-backed document store: one JSONB table per collection.
pub struct PgStore {
    pool: PgPool,
    ready: RwLock<HashSet<String>>,
}

impl PgStore {
    pub async fn connect(database_url: &str, config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        info!("Connected document store pool (max {} connections)", config.max_connections);
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            ready: RwLock::new(HashSet::new()),
        }
    }

    /// Create the backing table for a collection on first use
    async fn ensure_collection(&self, collection: &str) -> Result<String, StoreError> {
        validate_collection(collection)?;
        let table = quote_identifier(collection);

        {
            let ready = self.ready.read().await;
            if ready.contains(collection) {
                return Ok(table);
            }
        }

        let create = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                key TEXT PRIMARY KEY,
                doc JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
            table
        );
        sqlx::query(&create).execute(&self.pool).await?;

        let index = format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} USING GIN (doc jsonb_path_ops)",
            quote_identifier(&format!("{}_doc_idx", collection)),
            table
        );
        sqlx::query(&index).execute(&self.pool).await?;

        self.ready.write().await.insert(collection.to_string());
        debug!("Collection table ready: {}", collection);
        Ok(table)
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert(&self, collection: &str, mut doc: Document) -> Result<Document, StoreError> {
        let table = self.ensure_collection(collection).await?;

        let key = new_key();
        doc.insert(KEY_FIELD.to_string(), Value::String(key.clone()));

        let sql = format!("INSERT INTO {} (key, doc) VALUES ($1, $2)", table);
        sqlx::query(&sql)
            .bind(&key)
            .bind(Json(Value::Object(doc.clone())))
            .execute(&self.pool)
            .await?;

        Ok(doc)
    }

    async fn fetch(&self, collection: &str, query: &Document) -> Result<Vec<Document>, StoreError> {
        let table = self.ensure_collection(collection).await?;

        let sql = format!("SELECT doc FROM {} WHERE doc @> $1", table);
        let rows: Vec<(Json<Value>,)> = sqlx::query_as(&sql)
            .bind(Json(Value::Object(query.clone())))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|(Json(value),)| into_document(value)).collect()
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, StoreError> {
        let table = self.ensure_collection(collection).await?;

        let sql = format!("SELECT doc FROM {} WHERE key = $1", table);
        let row: Option<(Json<Value>,)> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|(Json(value),)| into_document(value)).transpose()
    }

    async fn update(&self, collection: &str, key: &str, mut doc: Document) -> Result<Document, StoreError> {
        let table = self.ensure_collection(collection).await?;

        doc.insert(KEY_FIELD.to_string(), Value::String(key.to_string()));

        let sql = format!("UPDATE {} SET doc = $2 WHERE key = $1", table);
        let result = sqlx::query(&sql)
            .bind(key)
            .bind(Json(Value::Object(doc.clone())))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("key '{}' in '{}'", key, collection)));
        }
        Ok(doc)
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let table = self.ensure_collection(collection).await?;

        let sql = format!("DELETE FROM {} WHERE key = $1", table);
        sqlx::query(&sql).bind(key).execute(&self.pool).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

/// Quote SQL identifier to prevent injection
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn into_document(value: Value) -> Result<Document, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(serde::de::Error::custom(format!(
            "expected JSON object document, found {}",
            other
        )))),
    }
}
