use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use super::guard::{Action, OwnershipGuard, Rejection};
use super::{NewRecord, Record, Resource, OWNER_FIELD};
use crate::auth::Principal;
use crate::store::{Document, DocumentStore, StoreError};

/// Result of a guarded mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<R> {
    Applied(Record<R>),
    Rejected(Rejection),
}

/// List/create/update/delete for one resource type, scoped by owner
pub struct ResourceService<R> {
    store: Arc<dyn DocumentStore>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> ResourceService<R> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _resource: PhantomData,
        }
    }

    /// Every record owned by `owner_username`, in store order. Unauthenticated.
    pub async fn list(&self, owner_username: &str) -> Result<Vec<Record<R>>, StoreError> {
        let mut query = Document::new();
        query.insert(OWNER_FIELD.to_string(), json!(owner_username));

        self.store
            .fetch(R::NAME, &query)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Persist a new record owned by the principal
    pub async fn create(&self, principal: &Principal, fields: R) -> Result<Record<R>, StoreError> {
        let doc = encode(&NewRecord {
            owner_username: &principal.username,
            fields: &fields,
        })?;

        let record = decode::<R>(self.store.insert(R::NAME, doc).await?)?;
        info!("Created {} {} for '{}'", R::NAME, record.key, principal.username);
        Ok(record)
    }

    /// Replace a record's fields. The original owner is kept.
    pub async fn update(&self, principal: &Principal, key: &str, fields: R) -> Result<Outcome<R>, StoreError> {
        let existing = match self.guarded_fetch(principal, key, Action::Update).await? {
            Ok(record) => record,
            Err(rejection) => return Ok(Outcome::Rejected(rejection)),
        };

        let doc = encode(&NewRecord {
            owner_username: &existing.owner_username,
            fields: &fields,
        })?;

        let record = decode::<R>(self.store.update(R::NAME, key, doc).await?)?;
        info!("Updated {} {} for '{}'", R::NAME, key, principal.username);
        Ok(Outcome::Applied(record))
    }

    /// Remove a record and hand back its prior state
    pub async fn delete(&self, principal: &Principal, key: &str) -> Result<Outcome<R>, StoreError> {
        let existing = match self.guarded_fetch(principal, key, Action::Delete).await? {
            Ok(record) => record,
            Err(rejection) => return Ok(Outcome::Rejected(rejection)),
        };

        self.store.delete(R::NAME, key).await?;
        info!("Deleted {} {} for '{}'", R::NAME, key, principal.username);
        Ok(Outcome::Applied(existing))
    }

    /// Load a record by key and run the ownership check against it
    async fn guarded_fetch(
        &self,
        principal: &Principal,
        key: &str,
        action: Action,
    ) -> Result<Result<Record<R>, Rejection>, StoreError> {
        let doc = self
            .store
            .get(R::NAME, key)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{} '{}'", R::NAME, key)))?;
        let record = decode::<R>(doc)?;

        match OwnershipGuard::check(&record, principal, action, R::NAME) {
            Ok(()) => Ok(Ok(record)),
            Err(rejection) => {
                warn!(
                    "'{}' denied {:?} on {} {} owned by '{}'",
                    principal.username, action, R::NAME, key, record.owner_username
                );
                Ok(Err(rejection))
            }
        }
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::Serialization(serde::ser::Error::custom(format!(
            "record did not serialize to an object: {}",
            other
        )))),
    }
}

fn decode<R: Resource>(doc: Document) -> Result<Record<R>, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{ActType, Contact, Project, ProjectForm, Timeline};
    use crate::store::MemoryStore;
    use crate::testing::{principal, FailingStore};

    fn contact(name: &str) -> Contact {
        Contact {
            name: name.to_string(),
            label: "me".to_string(),
            link: None,
        }
    }

    fn contacts() -> (Arc<MemoryStore>, ResourceService<Contact>) {
        let store = Arc::new(MemoryStore::new());
        let service = ResourceService::<Contact>::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn list_is_empty_for_unknown_owner() {
        let (_, service) = contacts();
        assert!(service.list("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_forces_owner_from_principal() {
        let (_, service) = contacts();
        let alice = principal("alice");

        let record = service.create(&alice, contact("GitHub")).await.unwrap();
        assert_eq!(record.owner_username, "alice");
        assert!(!record.key.is_empty());

        let listed = service.list("alice").await.unwrap();
        assert_eq!(listed, vec![record]);
        assert!(service.list("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn owner_can_update_and_owner_is_preserved() {
        let (_, service) = contacts();
        let alice = principal("alice");
        let created = service.create(&alice, contact("GitHub")).await.unwrap();

        let outcome = service.update(&alice, &created.key, contact("GitLab")).await.unwrap();
        let Outcome::Applied(updated) = outcome else {
            panic!("owner update was rejected");
        };
        assert_eq!(updated.key, created.key);
        assert_eq!(updated.owner_username, "alice");
        assert_eq!(updated.fields.name, "GitLab");

        let listed = service.list("alice").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].fields.name, "GitLab");
    }

    #[tokio::test]
    async fn other_user_cannot_update_or_delete() {
        let (_, service) = contacts();
        let alice = principal("alice");
        let bob = principal("bob");
        let created = service.create(&alice, contact("GitHub")).await.unwrap();

        let update = service.update(&bob, &created.key, contact("Hijacked")).await.unwrap();
        assert!(matches!(update, Outcome::Rejected(ref r) if r.action == Action::Update));

        let delete = service.delete(&bob, &created.key).await.unwrap();
        let Outcome::Rejected(rejection) = delete else {
            panic!("foreign delete was applied");
        };
        assert_eq!(rejection.message(), "Cannot delete another person's contact");

        assert_eq!(service.list("alice").await.unwrap(), vec![created]);
        assert!(service.list("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_returns_prior_state_and_removes() {
        let (store, service) = contacts();
        let alice = principal("alice");
        let created = service.create(&alice, contact("GitHub")).await.unwrap();

        let outcome = service.delete(&alice, &created.key).await.unwrap();
        assert_eq!(outcome, Outcome::Applied(created.clone()));
        assert!(store.get("contact", &created.key).await.unwrap().is_none());
        assert!(service.list("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let (_, service) = contacts();
        let alice = principal("alice");

        assert!(matches!(
            service.update(&alice, "missing", contact("x")).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(service.delete(&alice, "missing").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let service = ResourceService::<Contact>::new(Arc::new(FailingStore));
        assert!(matches!(service.list("alice").await, Err(StoreError::Unavailable(_))));
        assert!(matches!(
            service.create(&principal("alice"), contact("x")).await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn project_scenario_stores_normalized_stack() {
        let store = Arc::new(MemoryStore::new());
        let service = ResourceService::<Project>::new(store);
        let alice = principal("alice");

        let fields = Project::from_form(ProjectForm {
            title: "X".to_string(),
            date: "2024".to_string(),
            summary: "demo".to_string(),
            stack: "go, rust".to_string(),
            github: "https://github.com/alice/x".to_string(),
            demo: "https://x.example.com".to_string(),
            image: None,
        })
        .unwrap();
        service.create(&alice, fields).await.unwrap();

        let listed = service.list("alice").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].owner_username, "alice");
        assert_eq!(listed[0].fields.stack, vec!["go", "rust"]);
    }

    #[tokio::test]
    async fn timeline_round_trips_through_store() {
        let store = Arc::new(MemoryStore::new());
        let service = ResourceService::<Timeline>::new(store.clone());
        let alice = principal("alice");

        let entry = Timeline {
            title: "Engineer".to_string(),
            description: "Backend".to_string(),
            place: "Acme".to_string(),
            act_type: ActType::Work,
            start_date: Some("2020".to_string()),
            end_date: None,
            date: None,
        };
        let created = service.create(&alice, entry.clone()).await.unwrap();
        assert_eq!(created.fields, entry);

        let raw = store.get("timeline", &created.key).await.unwrap().unwrap();
        assert_eq!(raw["type"], "work");
        assert_eq!(raw["username"], "alice");
    }
}
