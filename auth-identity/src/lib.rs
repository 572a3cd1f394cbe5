//! Identity management and session authentication for MedGate
//!
//! This crate is the credential and session layer of the platform:
//! - Registration of a base identity plus exactly one role extension
//!   (doctor, nurse or patient), atomic from the outside
//! - Argon2id password hashing and verification
//! - Signed, 24-hour session tokens (HS256 JWT)
//! - Resolution of a presented token back to an identity
//!
//! Storage is pluggable through [`IdentityRepository`]; an in-memory
//! implementation backs development and tests, PostgreSQL backs deployments.
//!
//! # Example
//!
//! ```rust,no_run
//! use auth_identity::{
//!     Environment, IdentityConfig, IdentityService, InMemoryIdentityRepository,
//!     LoginRequest,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), auth_identity::IdentityError> {
//! let config = IdentityConfig::new(Environment::Development, None)?;
//! let service = IdentityService::new(Arc::new(InMemoryIdentityRepository::new()), &config)?;
//!
//! let outcome = service
//!     .login(LoginRequest {
//!         email: Some("a@x.com".into()),
//!         password: Some("secret123".into()),
//!     })
//!     .await?;
//! let identity = service.authenticate(Some(&outcome.token.token)).await?;
//! # let _ = identity;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod password;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod store;
pub mod token;
pub mod validation;

pub use config::*;
pub use error::*;
pub use models::*;
pub use password::PasswordHasher;
pub use postgres::PgIdentityRepository;
pub use repository::{IdentityRepository, InMemoryIdentityRepository};
pub use service::*;
pub use store::CredentialStore;
pub use token::*;
