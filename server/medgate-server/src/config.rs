//! Server settings
//!
//! Sources, lowest precedence first: optional config file, environment
//! variables, command-line flags.

use auth_identity::Environment;
use ::config::{Config, ConfigError, Environment as EnvSource, File};
use serde::Deserialize;
use std::fmt;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:3000";

#[derive(Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origin; credentials are allowed for it
    #[serde(default = "default_frontend_origin")]
    pub frontend_origin: String,

    /// PostgreSQL connection string; absent means in-memory storage
    #[serde(default)]
    pub database_url: Option<String>,

    /// Session token signing secret
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// development | test | production
    #[serde(default, rename = "medgate_env")]
    pub environment: Option<String>,
}

/// Values given on the command line; `None` leaves lower layers in charge.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub environment: Option<String>,
}

impl ServerSettings {
    /// Loads `path` (if present), then the process environment, then `overrides`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a source is malformed or a value has the
    /// wrong type.
    pub fn load(path: &str, overrides: &CliOverrides) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(EnvSource::default().try_parsing(true))
            .set_override_option("host", overrides.host.clone())?
            .set_override_option("port", overrides.port.map(i64::from))?
            .set_override_option("medgate_env", overrides.environment.clone())?;

        Self::from_config(builder.build()?)
    }

    pub(crate) fn from_config(config: Config) -> Result<Self, ConfigError> {
        config.try_deserialize()
    }

    /// # Errors
    ///
    /// Returns [`auth_identity::IdentityError::Configuration`] for an
    /// unrecognised environment name.
    pub fn environment(&self) -> auth_identity::Result<Environment> {
        self.environment
            .as_deref()
            .map_or(Ok(Environment::Development), |value| value.parse())
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("frontend_origin", &self.frontend_origin)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("environment", &self.environment)
            .finish()
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_frontend_origin() -> String {
    DEFAULT_FRONTEND_ORIGIN.to_string()
}
