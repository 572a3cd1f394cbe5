use auth_identity::{
    Environment, IdentityConfig, IdentityRepository, IdentityService, InMemoryIdentityRepository,
};
use axum::http::HeaderValue;
use error_common::{MedGateError, Result};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityService,
    pub environment: Environment,
    pub frontend_origin: HeaderValue,
}

impl AppState {
    /// # Errors
    ///
    /// `ConfigError` for an unusable frontend origin or identity configuration.
    pub fn new(
        repository: Arc<dyn IdentityRepository>,
        identity_config: &IdentityConfig,
        frontend_origin: &str,
    ) -> Result<Self> {
        let frontend_origin = HeaderValue::from_str(frontend_origin).map_err(|e| {
            MedGateError::ConfigError(format!("invalid FRONTEND_ORIGIN '{frontend_origin}': {e}"))
        })?;
        let identity = IdentityService::new(repository, identity_config)
            .map_err(|e| MedGateError::ConfigError(e.to_string()))?;

        Ok(Self {
            identity,
            environment: identity_config.environment,
            frontend_origin,
        })
    }

    /// State over a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Same as [`AppState::new`].
    pub fn in_memory(identity_config: &IdentityConfig, frontend_origin: &str) -> Result<Self> {
        Self::new(
            Arc::new(InMemoryIdentityRepository::new()),
            identity_config,
            frontend_origin,
        )
    }

    pub fn storage_backend(&self) -> &'static str {
        self.identity.store().backend_name()
    }

    /// Session cookie lifetime; always the signed token's lifetime.
    pub fn session_lifetime(&self) -> time::Duration {
        time::Duration::seconds(self.identity.tokens().ttl().num_seconds())
    }
}
