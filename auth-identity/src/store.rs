use crate::error::Result;
use crate::models::{Identity, IdentityView, NewIdentity, Role, RoleExtension, RoleFields};
use crate::password::PasswordHasher;
use crate::repository::IdentityRepository;
use crate::validation::{normalize_email, validate_extension, validate_identity, PasswordPolicy};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Identity and role-extension persistence with validation and hashing
/// applied on the way in.
#[derive(Clone)]
pub struct CredentialStore {
    repository: Arc<dyn IdentityRepository>,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
}

impl CredentialStore {
    pub fn new(
        repository: Arc<dyn IdentityRepository>,
        hasher: PasswordHasher,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            repository,
            hasher,
            policy,
        }
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.repository.backend_name()
    }

    #[must_use]
    pub fn supports_transactions(&self) -> bool {
        self.repository.supports_transactions()
    }

    pub async fn is_healthy(&self) -> bool {
        self.repository.is_healthy().await
    }

    /// Case-insensitive lookup.
    ///
    /// # Errors
    ///
    /// Propagates storage faults.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        self.repository.find_by_email(&normalize_email(email)).await
    }

    /// Public view of the identity, without its password hash.
    ///
    /// # Errors
    ///
    /// Propagates storage faults.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<IdentityView>> {
        Ok(self.repository.find_by_id(id).await?.map(|identity| identity.view()))
    }

    /// # Errors
    ///
    /// Propagates storage faults.
    pub async fn find_extension(&self, identity_id: Uuid) -> Result<Option<RoleExtension>> {
        self.repository.find_extension(identity_id).await
    }

    /// Validates, hashes the password and stores a new identity.
    ///
    /// # Errors
    ///
    /// - `Validation` listing every violated field rule
    /// - `DuplicateEmail` if the email is already registered
    /// - `Hashing` / `Storage` for internal faults
    pub async fn create_identity(&self, input: &NewIdentity) -> Result<Identity> {
        let identity = self.build_identity(input).await?;
        self.repository.insert_identity(&identity).await?;
        debug!(identity_id = %identity.id, role = %identity.role, "Identity created");
        Ok(identity)
    }

    /// Validates `fields` for `role` and stores the extension.
    ///
    /// # Errors
    ///
    /// `Validation` naming the missing or invalid fields; `Storage` on write failure.
    pub async fn create_role_extension(
        &self,
        role: Role,
        identity_id: Uuid,
        fields: &RoleFields,
    ) -> Result<RoleExtension> {
        let extension = RoleExtension::new(identity_id, validate_extension(role, fields)?);
        self.repository.insert_extension(&extension).await?;
        debug!(identity_id = %identity_id, role = %role, "Role extension created");
        Ok(extension)
    }

    /// Writes identity and extension together. Only valid when
    /// [`CredentialStore::supports_transactions`] is true.
    ///
    /// # Errors
    ///
    /// Same as [`CredentialStore::create_identity`] and
    /// [`CredentialStore::create_role_extension`]; nothing is written on error.
    pub async fn create_identity_with_extension(
        &self,
        input: &NewIdentity,
        fields: &RoleFields,
    ) -> Result<(Identity, RoleExtension)> {
        let identity = self.build_identity(input).await?;
        let extension = RoleExtension::new(identity.id, validate_extension(identity.role, fields)?);
        self.repository
            .insert_identity_with_extension(&identity, &extension)
            .await?;
        Ok((identity, extension))
    }

    /// Idempotent removal, used to undo a partial registration.
    ///
    /// # Errors
    ///
    /// Propagates storage faults.
    pub async fn delete_identity(&self, id: Uuid) -> Result<()> {
        self.repository.delete_identity(id).await
    }

    async fn build_identity(&self, input: &NewIdentity) -> Result<Identity> {
        let valid = validate_identity(input, &self.policy)?;
        let password_hash = self.hasher.hash(&input.password).await?;

        Ok(Identity {
            id: Uuid::new_v4(),
            name: valid.name,
            email: valid.email,
            age: valid.age,
            password_hash,
            role: valid.role,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IdentityError;
    use crate::models::RoleProfile;
    use crate::repository::InMemoryIdentityRepository;

    fn store() -> CredentialStore {
        CredentialStore::new(
            Arc::new(InMemoryIdentityRepository::new()),
            PasswordHasher::new().unwrap(),
            PasswordPolicy::default(),
        )
    }

    fn alice() -> NewIdentity {
        NewIdentity {
            name: "Alice".into(),
            email: "Alice@X.com".into(),
            age: 30_i64.into(),
            password: "secret123".into(),
            role: "nurse".into(),
        }
    }

    #[tokio::test]
    async fn create_hashes_and_normalizes() {
        let store = store();
        let identity = store.create_identity(&alice()).await.unwrap();

        assert_eq!(identity.email, "alice@x.com");
        assert_ne!(identity.password_hash, "secret123");
        assert!(identity.password_hash.starts_with("$argon2id$"));

        let found = store.find_by_email("ALICE@x.com ").await.unwrap().unwrap();
        assert_eq!(found.id, identity.id);

        let view = store.find_by_id(identity.id).await.unwrap().unwrap();
        assert_eq!(view.email, "alice@x.com");
    }

    #[tokio::test]
    async fn duplicate_email_differing_in_case() {
        let store = store();
        store.create_identity(&alice()).await.unwrap();

        let mut again = alice();
        again.email = "alice@x.COM".into();
        assert!(matches!(
            store.create_identity(&again).await,
            Err(IdentityError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn invalid_identity_is_not_written() {
        let store = store();
        let mut input = alice();
        input.age = (-3_i64).into();
        input.role = "janitor".into();

        let Err(IdentityError::Validation(violations)) = store.create_identity(&input).await else {
            panic!("expected validation failure");
        };
        assert_eq!(violations.len(), 2);
        assert!(store.find_by_email("alice@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn extension_variant_matches_role() {
        let store = store();
        let identity = store.create_identity(&alice()).await.unwrap();
        let fields = RoleFields {
            department: Some("ER".into()),
            shift: Some("night".into()),
            ..Default::default()
        };

        let extension = store
            .create_role_extension(identity.role, identity.id, &fields)
            .await
            .unwrap();
        assert_eq!(extension.role(), Role::Nurse);

        let stored = store.find_extension(identity.id).await.unwrap().unwrap();
        assert!(matches!(stored.profile, RoleProfile::Nurse(ref n) if n.shift == "night"));
    }
}
