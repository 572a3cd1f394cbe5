use database_layer::DatabaseError;
use error_common::codes;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Why a presented session was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthenticatedReason {
    MissingToken,
    TokenExpired,
    TokenInvalid,
    IdentityMissing,
}

impl UnauthenticatedReason {
    /// Client-facing message; expiry and forgery are deliberately the same.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::MissingToken => "Not authorized, no token",
            Self::TokenExpired | Self::TokenInvalid => "Not authorized, token failed",
            Self::IdentityMissing => "Not authorized, user not found",
        }
    }
}

impl fmt::Display for UnauthenticatedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Please provide all required fields")]
    MissingFields(Vec<String>),

    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("User with this email already exists")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Session token expired")]
    TokenExpired,

    #[error("Session token invalid")]
    TokenInvalid,

    #[error("{0}")]
    Unauthenticated(UnauthenticatedReason),

    #[error("User not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Rollback of identity {identity_id} failed: {cause}")]
    RollbackFailed { identity_id: Uuid, cause: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IdentityError {
    /// Stable machine-readable code for API responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingFields(_) => codes::validation::MISSING_REQUIRED_FIELD,
            Self::Validation(_) => codes::validation::INVALID_INPUT,
            Self::DuplicateEmail => codes::validation::DUPLICATE_EMAIL,
            Self::InvalidCredentials => codes::authentication::INVALID_CREDENTIALS,
            Self::TokenExpired => codes::authentication::TOKEN_EXPIRED,
            Self::TokenInvalid => codes::authentication::TOKEN_INVALID,
            Self::Unauthenticated(_) => codes::authentication::UNAUTHENTICATED,
            Self::NotFound => codes::resource::NOT_FOUND,
            Self::Storage(_) => codes::internal::STORAGE_FAULT,
            Self::RollbackFailed { .. } => codes::internal::ROLLBACK_FAILED,
            Self::Configuration(_) => codes::internal::CONFIGURATION,
            Self::Hashing(_) | Self::Internal(_) => codes::internal::INTERNAL_FAULT,
        }
    }

    /// Faults the caller cannot fix; their detail never leaves the process.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Storage(_)
                | Self::Hashing(_)
                | Self::RollbackFailed { .. }
                | Self::Configuration(_)
                | Self::Internal(_)
        )
    }
}

impl From<DatabaseError> for IdentityError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::UniqueViolation(constraint) if constraint == EMAIL_CONSTRAINT => {
                IdentityError::DuplicateEmail
            }
            other => IdentityError::Storage(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for IdentityError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::from(error).into()
    }
}

/// Name of the unique index guarding identity emails.
pub(crate) const EMAIL_CONSTRAINT: &str = "identities_email_key";

pub type Result<T> = std::result::Result<T, IdentityError>;
