use crate::error::{IdentityError, Result};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Signing secret used when no `JWT_SECRET` is configured outside production.
pub const DEVELOPMENT_FALLBACK_SECRET: &str = "medgate-development-only-signing-secret";

/// Minimum accepted length, in bytes, of a production signing secret.
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
pub const DEFAULT_PASSWORD_MIN_LENGTH: usize = 8;

/// Deployment environment, read from `MEDGATE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    #[must_use]
    pub fn is_development(self) -> bool {
        self == Self::Development
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = IdentityError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            other => Err(IdentityError::Configuration(format!(
                "unknown environment '{other}' (expected development, test or production)"
            ))),
        }
    }
}

#[derive(Debug)]
pub struct IdentityConfig {
    pub token_secret: SecretString,
    pub token_ttl_hours: i64,
    pub password_min_length: usize,
    pub environment: Environment,
}

impl IdentityConfig {
    /// Builds the configuration for `environment` from an optional configured
    /// signing secret.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Configuration`] when running in production
    /// without a usable secret.
    pub fn new(environment: Environment, configured_secret: Option<String>) -> Result<Self> {
        Ok(Self {
            token_secret: resolve_secret(environment, configured_secret)?,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            password_min_length: DEFAULT_PASSWORD_MIN_LENGTH,
            environment,
        })
    }

    /// Test configuration signed with a caller-chosen secret.
    #[must_use]
    pub fn with_secret(secret: &str) -> Self {
        Self {
            token_secret: SecretString::new(secret.to_string()),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            password_min_length: DEFAULT_PASSWORD_MIN_LENGTH,
            environment: Environment::Test,
        }
    }
}

/// Production refuses to start without a strong secret; other environments
/// fall back to [`DEVELOPMENT_FALLBACK_SECRET`] and say so loudly.
///
/// # Errors
///
/// Returns [`IdentityError::Configuration`] for a missing, fallback-valued
/// or short secret in production.
pub fn resolve_secret(
    environment: Environment,
    configured_secret: Option<String>,
) -> Result<SecretString> {
    let configured = configured_secret.filter(|secret| !secret.trim().is_empty());

    match (environment, configured) {
        (Environment::Production, None) => Err(IdentityError::Configuration(
            "JWT_SECRET must be set in production".to_string(),
        )),
        (Environment::Production, Some(secret)) => {
            let secret = SecretString::new(secret);
            if secret.expose_secret() == DEVELOPMENT_FALLBACK_SECRET {
                return Err(IdentityError::Configuration(
                    "JWT_SECRET must not use the development fallback value in production"
                        .to_string(),
                ));
            }
            if secret.expose_secret().len() < MIN_PRODUCTION_SECRET_LEN {
                return Err(IdentityError::Configuration(format!(
                    "JWT_SECRET must be at least {MIN_PRODUCTION_SECRET_LEN} bytes in production"
                )));
            }
            Ok(secret)
        }
        (_, Some(secret)) => Ok(SecretString::new(secret)),
        (environment, None) => {
            warn!(
                environment = %environment,
                "JWT_SECRET not set, signing session tokens with the development fallback secret"
            );
            Ok(SecretString::new(DEVELOPMENT_FALLBACK_SECRET.to_string()))
        }
    }
}
