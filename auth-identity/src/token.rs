//! Session token issuance and verification
//!
//! Tokens are stateless HS256 JWTs carrying the identity id, role and
//! issue/expiry instants. Nothing is stored server-side.

use crate::config::IdentityConfig;
use crate::error::{IdentityError, Result};
use crate::models::Role;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// CLAIMS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (identity ID)
    pub sub: String,

    /// Role at issuance
    pub role: Role,

    /// Issued at (seconds since epoch)
    pub iat: i64,

    /// Expiration (seconds since epoch)
    pub exp: i64,
}

impl SessionClaims {
    /// # Errors
    ///
    /// Returns [`IdentityError::TokenInvalid`] if `sub` is not a UUID.
    pub fn identity_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| IdentityError::TokenInvalid)
    }
}

/// A freshly signed token and the instant it stops being accepted.
#[derive(Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// What a valid token proves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSession {
    pub identity_id: Uuid,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// TOKEN SERVICE
// =============================================================================

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        let secret = config.token_secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::hours(config.token_ttl_hours),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Signs a token for `identity_id` valid for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Internal`] if encoding fails.
    pub fn issue(&self, identity_id: Uuid, role: Role) -> Result<IssuedToken> {
        self.issue_at(identity_id, role, Utc::now())
    }

    /// Like [`TokenService::issue`] with an explicit issue instant.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Internal`] if encoding fails.
    pub fn issue_at(
        &self,
        identity_id: Uuid,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        let expires_at = issued_at + self.ttl;
        let claims = SessionClaims {
            sub: identity_id.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| IdentityError::Internal(anyhow::anyhow!("failed to sign token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Checks signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::TokenExpired`] for an expired but otherwise
    /// genuine token and [`IdentityError::TokenInvalid`] for anything
    /// tampered, malformed or signed with another key.
    pub fn verify(&self, token: &str) -> Result<VerifiedSession> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => IdentityError::TokenExpired,
                _ => IdentityError::TokenInvalid,
            },
        )?;

        let claims = data.claims;
        Ok(VerifiedSession {
            identity_id: claims.identity_id()?,
            role: claims.role,
            issued_at: timestamp(claims.iat)?,
            expires_at: timestamp(claims.exp)?,
        })
    }
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or(IdentityError::TokenInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&IdentityConfig::with_secret(secret))
    }

    #[test]
    fn issued_token_verifies() {
        let tokens = service("unit-test-secret");
        let id = Uuid::new_v4();
        let issued = tokens.issue(id, Role::Doctor).unwrap();
        let session = tokens.verify(&issued.token).unwrap();

        assert_eq!(session.identity_id, id);
        assert_eq!(session.role, Role::Doctor);
        assert_eq!(session.expires_at - session.issued_at, Duration::hours(24));
        assert_eq!(session.expires_at.timestamp(), issued.expires_at.timestamp());
    }

    #[test]
    fn expired_token_is_distinguished() {
        let tokens = service("unit-test-secret");
        let issued = tokens
            .issue_at(Uuid::new_v4(), Role::Patient, Utc::now() - Duration::hours(25))
            .unwrap();

        assert!(matches!(
            tokens.verify(&issued.token),
            Err(IdentityError::TokenExpired)
        ));
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let ours = service("unit-test-secret");
        let theirs = service("some-other-secret");
        let forged = theirs.issue(Uuid::new_v4(), Role::Nurse).unwrap();

        assert!(matches!(
            ours.verify(&forged.token),
            Err(IdentityError::TokenInvalid)
        ));
    }

    #[test]
    fn swapped_payload_is_invalid() {
        let tokens = service("unit-test-secret");
        let nurse = tokens.issue(Uuid::new_v4(), Role::Nurse).unwrap().token;
        let doctor = tokens.issue(Uuid::new_v4(), Role::Doctor).unwrap().token;

        let nurse_parts: Vec<&str> = nurse.split('.').collect();
        let doctor_parts: Vec<&str> = doctor.split('.').collect();
        let tampered = format!("{}.{}.{}", nurse_parts[0], doctor_parts[1], nurse_parts[2]);

        assert!(matches!(
            tokens.verify(&tampered),
            Err(IdentityError::TokenInvalid)
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        let tokens = service("unit-test-secret");
        for garbage in ["", "abc", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.e30."] {
            assert!(matches!(
                tokens.verify(garbage),
                Err(IdentityError::TokenInvalid)
            ));
        }
    }
}
