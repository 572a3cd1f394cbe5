use crate::error::{IdentityError, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

/// Argon2id memory cost in KiB (19 MiB)
const M_COST: u32 = 19_456;
/// Argon2id iterations
const T_COST: u32 = 2;
/// Argon2id parallelism
const P_COST: u32 = 1;
/// Output length in bytes
const OUTPUT_LEN: usize = 32;

/// Argon2id password hashing.
///
/// Hashing is CPU-bound, so both operations run on the blocking pool.
/// The PHC string output embeds algorithm, parameters and salt.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    // Verified against when a login names an unknown email so both
    // branches spend the same time.
    timing_hash: String,
}

impl PasswordHasher {
    /// # Errors
    ///
    /// Returns [`IdentityError::Hashing`] if the Argon2 parameters are rejected.
    pub fn new() -> Result<Self> {
        let params = Params::new(M_COST, T_COST, P_COST, Some(OUTPUT_LEN))
            .map_err(|e| IdentityError::Hashing(format!("failed to build Argon2 params: {e}")))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let timing_hash = hash_with(&argon2, "medgate-timing-equalizer")?;

        Ok(Self {
            argon2,
            timing_hash,
        })
    }

    /// Hashes `password` with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Hashing`] if hashing fails or the blocking
    /// task panics.
    pub async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let argon2 = self.argon2.clone();

        tokio::task::spawn_blocking(move || hash_with(&argon2, &password))
            .await
            .map_err(|e| IdentityError::Hashing(format!("password hashing task failed: {e}")))?
    }

    /// Checks `password` against a stored PHC hash. A malformed hash is a
    /// mismatch, never an error.
    pub async fn verify(&self, password: &str, hash: &str) -> bool {
        let password = password.to_string();
        let hash = hash.to_string();
        let argon2 = self.argon2.clone();

        match tokio::task::spawn_blocking(move || verify_with(&argon2, &password, &hash)).await {
            Ok(matches) => matches,
            Err(e) => {
                error!(error = %e, "Password verification task failed");
                false
            }
        }
    }

    /// Burns one verification without a real hash to compare against.
    pub async fn verify_dummy(&self, password: &str) {
        let timing_hash = self.timing_hash.clone();
        let _ = self.verify(password, &timing_hash).await;
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Hashing(format!("failed to hash password: {e}")))
}

fn verify_with(argon2: &Argon2<'_>, password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    // Output comparison inside verify_password is constant-time.
    argon2.verify_password(password.as_bytes(), &parsed).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = PasswordHasher::new().unwrap();
        let hash = hasher.hash("secret123").await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("secret123", &hash).await);
        assert!(!hasher.verify("secret124", &hash).await);
    }

    #[tokio::test]
    async fn salts_are_fresh() {
        let hasher = PasswordHasher::new().unwrap();
        let first = hasher.hash("secret123").await.unwrap();
        let second = hasher.hash("secret123").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(first.len(), second.len());
    }

    #[tokio::test]
    async fn malformed_hash_is_a_mismatch() {
        let hasher = PasswordHasher::new().unwrap();
        assert!(!hasher.verify("secret123", "").await);
        assert!(!hasher.verify("secret123", "not-a-phc-string").await);
        assert!(!hasher.verify("secret123", "$argon2id$v=19$garbage").await);
    }
}
