use crate::error::{IdentityError, Result};
use crate::models::{Identity, RoleExtension};
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;
use uuid::Uuid;

/// Storage seam for identities and their role extensions.
///
/// Implementations must enforce email uniqueness themselves: two concurrent
/// `insert_identity` calls with the same (normalized) email must not both
/// succeed.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Short name for logs and health output
    fn backend_name(&self) -> &'static str;

    /// `email` is already normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>>;

    /// Fails with [`IdentityError::DuplicateEmail`] if the email is taken.
    async fn insert_identity(&self, identity: &Identity) -> Result<()>;

    async fn insert_extension(&self, extension: &RoleExtension) -> Result<()>;

    async fn find_extension(&self, identity_id: Uuid) -> Result<Option<RoleExtension>>;

    /// Removes the identity and any extension. Deleting an absent id succeeds.
    async fn delete_identity(&self, id: Uuid) -> Result<()>;

    /// Whether [`IdentityRepository::insert_identity_with_extension`] is
    /// available.
    fn supports_transactions(&self) -> bool {
        false
    }

    /// Whether the backend currently answers queries.
    async fn is_healthy(&self) -> bool {
        true
    }

    /// Writes both records in one transaction.
    async fn insert_identity_with_extension(
        &self,
        _identity: &Identity,
        _extension: &RoleExtension,
    ) -> Result<()> {
        Err(IdentityError::Internal(anyhow::anyhow!(
            "{} does not support multi-record transactions",
            self.backend_name()
        )))
    }
}

/// In-memory repository for development and tests
#[derive(Clone)]
pub struct InMemoryIdentityRepository {
    identities: Arc<DashMap<Uuid, Identity>>,
    email_index: Arc<DashMap<String, Uuid>>,
    extensions: Arc<DashMap<Uuid, RoleExtension>>,
}

impl InMemoryIdentityRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            identities: Arc::new(DashMap::new()),
            email_index: Arc::new(DashMap::new()),
            extensions: Arc::new(DashMap::new()),
        }
    }

    #[must_use]
    pub fn identity_count(&self) -> usize {
        self.identities.len()
    }

    #[must_use]
    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }
}

impl Default for InMemoryIdentityRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    fn backend_name(&self) -> &'static str {
        "in-memory"
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let id = self.email_index.get(email).map(|entry| *entry.value());
        Ok(id.and_then(|id| self.identities.get(&id).map(|entry| entry.value().clone())))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        Ok(self.identities.get(&id).map(|entry| entry.value().clone()))
    }

    async fn insert_identity(&self, identity: &Identity) -> Result<()> {
        // The vacant entry holds the index shard lock until the identity is in place.
        match self.email_index.entry(identity.email.clone()) {
            Entry::Occupied(_) => Err(IdentityError::DuplicateEmail),
            Entry::Vacant(slot) => {
                self.identities.insert(identity.id, identity.clone());
                slot.insert(identity.id);
                Ok(())
            }
        }
    }

    async fn insert_extension(&self, extension: &RoleExtension) -> Result<()> {
        if !self.identities.contains_key(&extension.identity_id) {
            return Err(IdentityError::Storage(format!(
                "identity {} does not exist",
                extension.identity_id
            )));
        }
        match self.extensions.entry(extension.identity_id) {
            Entry::Occupied(_) => Err(IdentityError::Storage(format!(
                "identity {} already has a role extension",
                extension.identity_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(extension.clone());
                Ok(())
            }
        }
    }

    async fn find_extension(&self, identity_id: Uuid) -> Result<Option<RoleExtension>> {
        Ok(self
            .extensions
            .get(&identity_id)
            .map(|entry| entry.value().clone()))
    }

    async fn delete_identity(&self, id: Uuid) -> Result<()> {
        self.extensions.remove(&id);
        if let Some((_, identity)) = self.identities.remove(&id) {
            self.email_index
                .remove_if(&identity.email, |_, owner| *owner == id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NurseProfile, Role, RoleProfile};
    use chrono::Utc;

    fn identity(email: &str) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: email.into(),
            age: 30,
            password_hash: "hash".into(),
            role: Role::Nurse,
            created_at: Utc::now(),
        }
    }

    fn nurse_extension(identity_id: Uuid) -> RoleExtension {
        RoleExtension::new(
            identity_id,
            RoleProfile::Nurse(NurseProfile {
                department: "ER".into(),
                shift: "night".into(),
            }),
        )
    }

    #[tokio::test]
    async fn insert_and_find() {
        let repo = InMemoryIdentityRepository::new();
        let alice = identity("a@x.com");
        repo.insert_identity(&alice).await.unwrap();

        let by_email = repo.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, alice.id);
        let by_id = repo.find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@x.com");
        assert!(repo.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let repo = InMemoryIdentityRepository::new();
        repo.insert_identity(&identity("a@x.com")).await.unwrap();

        let result = repo.insert_identity(&identity("a@x.com")).await;
        assert!(matches!(result, Err(IdentityError::DuplicateEmail)));
        assert_eq!(repo.identity_count(), 1);
    }

    #[tokio::test]
    async fn extension_requires_identity() {
        let repo = InMemoryIdentityRepository::new();
        let result = repo.insert_extension(&nurse_extension(Uuid::new_v4())).await;
        assert!(matches!(result, Err(IdentityError::Storage(_))));
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_cascades() {
        let repo = InMemoryIdentityRepository::new();
        let alice = identity("a@x.com");
        repo.insert_identity(&alice).await.unwrap();
        repo.insert_extension(&nurse_extension(alice.id)).await.unwrap();

        repo.delete_identity(alice.id).await.unwrap();
        repo.delete_identity(alice.id).await.unwrap();

        assert!(repo.find_by_email("a@x.com").await.unwrap().is_none());
        assert!(repo.find_extension(alice.id).await.unwrap().is_none());
        assert_eq!(repo.extension_count(), 0);

        // The email is free again.
        repo.insert_identity(&identity("a@x.com")).await.unwrap();
    }

    #[tokio::test]
    async fn not_transactional() {
        let repo = InMemoryIdentityRepository::new();
        assert!(!repo.supports_transactions());
        assert!(repo.is_healthy().await);
        let alice = identity("a@x.com");
        let result = repo
            .insert_identity_with_extension(&alice, &nurse_extension(alice.id))
            .await;
        assert!(matches!(result, Err(IdentityError::Internal(_))));
    }
}
