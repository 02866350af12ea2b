use serde::Serialize;

use super::Record;
use crate::auth::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Update,
    Delete,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Action::Update => "change",
            Action::Delete => "delete",
        }
    }
}

/// An authenticated caller tried to mutate a record owned by someone else.
///
/// This is a normal outcome rather than an error: it is rendered as a regular
/// envelope with `status: 401` in the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub action: Action,
    pub resource: &'static str,
    pub key: String,
}

impl Rejection {
    pub fn message(&self) -> String {
        format!("Cannot {} another person's {}", self.action.verb(), self.resource)
    }
}

/// Ownership check shared by every mutating resource operation. Never touches the store.
pub struct OwnershipGuard;

impl OwnershipGuard {
    pub fn check<R>(
        record: &Record<R>,
        principal: &Principal,
        action: Action,
        resource: &'static str,
    ) -> Result<(), Rejection> {
        if record.owner_username == principal.username {
            Ok(())
        } else {
            Err(Rejection {
                action,
                resource,
                key: record.key.clone(),
            })
        }
    }
}
