use crate::config::IdentityConfig;
use crate::error::{IdentityError, Result, UnauthenticatedReason};
use crate::models::{
    Identity, IdentityView, LoginRequest, NewIdentity, RegistrationRequest, RoleExtension,
    RoleFields, SessionView,
};
use crate::password::PasswordHasher;
use crate::repository::IdentityRepository;
use crate::store::CredentialStore;
use crate::token::{IssuedToken, TokenService};
use crate::validation::PasswordPolicy;
use logger_redacted::redact_email;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Result of a successful signup.
#[derive(Debug, Clone)]
pub struct Registration {
    pub identity: IdentityView,
    pub extension: RoleExtension,
    pub token: IssuedToken,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub identity: SessionView,
    pub token: IssuedToken,
}

/// Registration, login and session resolution over a [`CredentialStore`].
#[derive(Clone)]
pub struct IdentityService {
    store: CredentialStore,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
}

impl IdentityService {
    /// # Errors
    ///
    /// Returns [`IdentityError::Hashing`] if the password hasher cannot be built.
    pub fn new(repository: Arc<dyn IdentityRepository>, config: &IdentityConfig) -> Result<Self> {
        let hasher = PasswordHasher::new()?;
        let policy = PasswordPolicy {
            min_length: config.password_min_length,
        };

        Ok(Self {
            store: CredentialStore::new(repository, hasher.clone(), policy),
            hasher,
            tokens: Arc::new(TokenService::new(config)),
        })
    }

    #[must_use]
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Creates an identity with its role extension and signs a session.
    ///
    /// Either both records end up stored or neither does. On transactional
    /// backends this is one commit; otherwise a failed extension write is
    /// undone by deleting the identity.
    ///
    /// # Errors
    ///
    /// - `MissingFields` when a base field is absent (checked first)
    /// - `DuplicateEmail` when the email is taken, including by a concurrent signup
    /// - `Validation` for identity or extension field violations
    /// - `RollbackFailed` if the compensating delete itself fails
    pub async fn register(&self, request: RegistrationRequest) -> Result<Registration> {
        let (new_identity, fields) = request.into_parts()?;
        let email_tag = redact_email(&new_identity.email);

        if self.store.find_by_email(&new_identity.email).await?.is_some() {
            info!(email = %email_tag, "Registration rejected, email already registered");
            return Err(IdentityError::DuplicateEmail);
        }

        let (identity, extension) = if self.store.supports_transactions() {
            self.store
                .create_identity_with_extension(&new_identity, &fields)
                .await?
        } else {
            self.create_with_rollback(&new_identity, &fields).await?
        };

        let token = self.tokens.issue(identity.id, identity.role)?;

        info!(
            identity_id = %identity.id,
            role = %identity.role,
            email = %email_tag,
            "Identity registered"
        );

        Ok(Registration {
            identity: identity.view(),
            extension,
            token,
        })
    }

    async fn create_with_rollback(
        &self,
        new_identity: &NewIdentity,
        fields: &RoleFields,
    ) -> Result<(Identity, RoleExtension)> {
        let identity = self.store.create_identity(new_identity).await?;

        match self
            .store
            .create_role_extension(identity.role, identity.id, fields)
            .await
        {
            Ok(extension) => Ok((identity, extension)),
            Err(cause) => {
                warn!(
                    identity_id = %identity.id,
                    role = %identity.role,
                    error = %cause,
                    "Role extension creation failed, rolling back identity"
                );

                if let Err(rollback) = self.store.delete_identity(identity.id).await {
                    error!(
                        identity_id = %identity.id,
                        error = %rollback,
                        cause = %cause,
                        "Rollback failed, identity persisted without its role extension"
                    );
                    return Err(IdentityError::RollbackFailed {
                        identity_id: identity.id,
                        cause: rollback.to_string(),
                    });
                }

                Err(cause)
            }
        }
    }

    /// Checks credentials and signs a session.
    ///
    /// An unknown email and a wrong password are indistinguishable: same
    /// error, and a hash verification is performed in both cases.
    ///
    /// # Errors
    ///
    /// `MissingFields`, `InvalidCredentials`, or a storage fault.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome> {
        let (email, password) = request.into_parts()?;
        let email_tag = redact_email(&email);

        let identity = self.store.find_by_email(&email).await?;
        let verified = match &identity {
            Some(identity) => self.hasher.verify(&password, &identity.password_hash).await,
            None => {
                self.hasher.verify_dummy(&password).await;
                false
            }
        };

        let identity = match identity {
            Some(identity) if verified => identity,
            _ => {
                info!(email = %email_tag, "Login rejected");
                return Err(IdentityError::InvalidCredentials);
            }
        };

        let token = self.tokens.issue(identity.id, identity.role)?;
        info!(identity_id = %identity.id, role = %identity.role, "Login succeeded");

        Ok(LoginOutcome {
            identity: identity.session_view(),
            token,
        })
    }

    /// Resolves a presented session token to its identity.
    ///
    /// No role check happens here.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` with the reason for any rejected token; storage
    /// faults propagate unchanged.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<IdentityView> {
        let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) else {
            return Err(IdentityError::Unauthenticated(UnauthenticatedReason::MissingToken));
        };

        let session = self.tokens.verify(token).map_err(|e| {
            let reason = match e {
                IdentityError::TokenExpired => UnauthenticatedReason::TokenExpired,
                _ => UnauthenticatedReason::TokenInvalid,
            };
            warn!(reason = ?reason, "Session token rejected");
            IdentityError::Unauthenticated(reason)
        })?;

        match self.store.find_by_id(session.identity_id).await? {
            Some(identity) => Ok(identity),
            None => {
                warn!(identity_id = %session.identity_id, "Session names an identity that no longer exists");
                Err(IdentityError::Unauthenticated(
                    UnauthenticatedReason::IdentityMissing,
                ))
            }
        }
    }

    /// Fresh lookup of an authenticated identity.
    ///
    /// # Errors
    ///
    /// `NotFound` if the identity has disappeared since authentication.
    pub async fn current_identity(&self, identity_id: Uuid) -> Result<SessionView> {
        self.store
            .find_by_id(identity_id)
            .await?
            .map(|identity| identity.session_view())
            .ok_or(IdentityError::NotFound)
    }
}
