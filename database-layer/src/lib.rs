//! PostgreSQL plumbing for MedGate
//!
//! Connection pooling, embedded schema migrations and a thin transaction
//! helper. Repositories in `auth-identity` build on these; nothing here knows
//! about identities or roles beyond the migration files.

pub mod connection;
pub mod error;
pub mod transaction;

pub use connection::DatabasePool;
pub use error::{DatabaseError, DatabaseResult};
pub use transaction::TransactionManager;
