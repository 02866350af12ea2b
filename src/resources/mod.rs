//! Owner-scoped portfolio resources.
//!
//! Contact, Project and Timeline share one shape: a flat record owned by a
//! single username. `ResourceService<R>` implements list/create/update/delete
//! once, and every mutation passes through the `OwnershipGuard`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub mod contact;
pub mod guard;
pub mod project;
pub mod service;
pub mod timeline;

pub use contact::{Contact, ContactForm};
pub use guard::{Action, OwnershipGuard, Rejection};
pub use project::{Project, ProjectForm};
pub use service::{Outcome, ResourceService};
pub use timeline::{ActType, Timeline, TimelineForm};

/// Document field holding the owner's username
pub const OWNER_FIELD: &str = "username";

/// A resource type stored in its own collection.
///
/// `Form` is the client input; it never carries the owner, which is always
/// taken from the authenticated principal.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name, also the URL segment (`/contact`, `/project`, ...)
    const NAME: &'static str;

    type Form: DeserializeOwned + Send + 'static;

    /// Validate and normalize client input into the stored field set
    fn from_form(form: Self::Form) -> Result<Self, ValidationError>;
}

/// A stored resource: its key, its owner and the type-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<R> {
    pub key: String,
    #[serde(rename = "username")]
    pub owner_username: String,
    #[serde(flatten)]
    pub fields: R,
}

/// Record contents before the store has assigned a key
#[derive(Serialize)]
pub(crate) struct NewRecord<'a, R> {
    #[serde(rename = "username")]
    pub owner_username: &'a str,
    #[serde(flatten)]
    pub fields: &'a R,
}

/// Input rejected before it reaches the store
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid value for '{field}': {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn field_errors(&self) -> HashMap<String, String> {
        HashMap::from([(self.field.clone(), self.message.clone())])
    }
}

/// Require an absolute URL (scheme and host)
pub(crate) fn validate_url(field: &str, value: &str) -> Result<String, ValidationError> {
    let parsed = url::Url::parse(value.trim())
        .map_err(|e| ValidationError::new(field, format!("invalid URL: {}", e)))?;

    if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
        return Err(ValidationError::new(field, "URL must include a scheme and host"));
    }
    Ok(value.trim().to_string())
}
