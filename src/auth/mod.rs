//! Credential issuance and bearer-token resolution.
//!
//! Credentials live in their own collection as `{username, password_digest}`.
//! A successful login yields a signed token whose subject is the username;
//! resolving a token loads the credential again, so a token for a username
//! that no longer resolves is rejected.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::store::{Document, DocumentStore, StoreError, KEY_FIELD};

pub mod password;
pub mod token;

pub use token::{Claims, TokenSigner};

/// Collection holding one credential per username
pub const CREDENTIAL_COLLECTION: &str = "users";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User '{0}' already exists")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token generation failed: {0}")]
    TokenIssue(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Stored credential record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub key: String,
    pub username: String,
    pub password_digest: String,
}

/// The authenticated identity for one request. Never carries the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub key: String,
    pub username: String,
}

impl From<Credential> for Principal {
    fn from(credential: Credential) -> Self {
        Self {
            key: credential.key,
            username: credential.username,
        }
    }
}

pub struct Authenticator {
    store: Arc<dyn DocumentStore>,
    signer: TokenSigner,
    // Held across the exists-check and insert of a signup
    signup_lock: Mutex<()>,
}

impl Authenticator {
    pub fn new(store: Arc<dyn DocumentStore>, signer: TokenSigner) -> Self {
        Self {
            store,
            signer,
            signup_lock: Mutex::new(()),
        }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Look up a credential by exact username.
    ///
    /// Absence is `Ok(None)`; a failing store is an error and is never reported as absence.
    pub async fn find_credential(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        let query = username_query(username);
        let mut items = self.store.fetch(CREDENTIAL_COLLECTION, &query).await?;
        debug!("Credential lookup for '{}' matched {} record(s)", username, items.len());

        match items.pop() {
            Some(doc) => Ok(Some(serde_json::from_value(Value::Object(doc))?)),
            None => Ok(None),
        }
    }

    /// Create a credential. Returns the stored username; no token is issued.
    pub async fn register(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let _guard = self.signup_lock.lock().await;

        if self.find_credential(username).await?.is_some() {
            warn!("Signup rejected: username '{}' is taken", username);
            return Err(AuthError::Conflict(username.to_string()));
        }

        let digest = password::hash_password(password)?;
        let mut doc = Document::new();
        doc.insert("username".to_string(), json!(username));
        doc.insert("password_digest".to_string(), json!(digest));

        let saved = self.store.insert(CREDENTIAL_COLLECTION, doc).await?;
        info!(
            "Registered user '{}' (key {})",
            username,
            saved.get(KEY_FIELD).and_then(serde_json::Value::as_str).unwrap_or_default()
        );

        Ok(username.to_string())
    }

    /// Verify a username/password pair and issue an access token
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let credential = match self.find_credential(username).await? {
            Some(credential) => credential,
            None => {
                warn!("Login rejected: unknown user '{}'", username);
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !password::verify_password(&credential.password_digest, password) {
            warn!("Login rejected: wrong password for '{}'", username);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.signer.issue(&credential.username)?;
        info!("Issued access token for '{}'", credential.username);
        Ok(token)
    }

    /// Turn a bearer token back into the principal it was issued to
    pub async fn resolve_token(&self, token: &str) -> Result<Principal, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let claims = self.signer.verify(token)?;
        match self.find_credential(&claims.sub).await? {
            Some(credential) => Ok(credential.into()),
            None => {
                warn!("Token subject '{}' does not resolve to a user", claims.sub);
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

fn username_query(username: &str) -> Document {
    let mut query = Document::new();
    query.insert("username".to_string(), json!(username));
    query
}
