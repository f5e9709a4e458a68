//! Driven port for idempotency record storage.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::idempotency::{IdempotencyLookupQuery, IdempotencyLookupResult};

use super::define_port_error;

define_port_error! {
    /// Errors raised by idempotency repository adapters.
    pub enum IdempotencyRepositoryError {
        Connection { message: String } => "idempotency repository connection failed: {message}",
        Query { message: String } => "idempotency repository query failed: {message}",
        Serialization { message: String } => "idempotency repository serialization failed: {message}",
    }
}

/// Read side of the replayable-response store.
///
/// Records are written by the ledger adapters together with the mutation they
/// guard (see [`crate::domain::idempotency::IdempotencyClaim`]). Lookups are
/// scoped to the query's user and mutation type, so a key reused by another
/// user or for another operation is treated as unseen.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdempotencyRepository: Send + Sync {
    async fn lookup(
        &self,
        query: &IdempotencyLookupQuery,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError>;

    /// Delete records older than `ttl`, returning how many were removed.
    async fn cleanup_expired(&self, ttl: Duration) -> Result<u64, IdempotencyRepositoryError>;
}
