// Transaction management
use crate::connection::DatabasePool;
use crate::error::{DatabaseError, DatabaseResult};
use sqlx::{Postgres, Transaction};
use tracing::debug;

/// Hands out transactions on a shared pool
///
/// Dropping an uncommitted transaction rolls it back.
#[derive(Clone)]
pub struct TransactionManager {
    pool: DatabasePool,
}

impl TransactionManager {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Begin a new transaction
    ///
    /// # Errors
    ///
    /// Returns `QueryFailed` if no connection could be acquired.
    pub async fn begin(&self) -> DatabaseResult<Transaction<'static, Postgres>> {
        debug!("Beginning transaction");

        self.pool
            .pool()
            .begin()
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Failed to begin transaction: {e}")))
    }
}
