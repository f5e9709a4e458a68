//! Idempotency records in the `idempotency_keys` table.
//!
//! The primary key is `(key, user_id, mutation_type)`, so one UUID may guard
//! a purchase and a rental for the same customer independently. Lookups do
//! not look at age; the housekeeping sweep deletes rows past the TTL.
//!
//! Rows are written only by the ledger adapters, inside the transaction of
//! the mutation they guard: [`reserve_claim`] inserts the row first with a
//! `null` snapshot, and [`complete_claim`] fills the snapshot in before
//! commit. A concurrent insert of the same key blocks on the primary key
//! until the holder commits or rolls back, so only one request gets past
//! the reservation.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use mockable::{Clock, DefaultClock};
use tracing::debug;

use crate::domain::idempotency::{
    IdempotencyClaim, IdempotencyLookupQuery, IdempotencyLookupResult, IdempotencyRecord,
    MutationType, PayloadHash,
};
use crate::domain::ports::{IdempotencyRepository, IdempotencyRepositoryError};
use crate::domain::{IdempotencyKey, UserId};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error};
use super::models::{IdempotencyKeyRow, NewIdempotencyKeyRow};
use super::pool::{DbPool, PoolError};
use super::schema::idempotency_keys;

#[derive(Clone)]
pub struct DieselIdempotencyRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselIdempotencyRepository {
    pub fn new(pool: DbPool) -> Self {
        Self::with_clock(pool, Arc::new(DefaultClock))
    }

    /// Repository whose TTL cutoff is measured against `clock`.
    pub fn with_clock(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn map_pool_error(error: PoolError) -> IdempotencyRepositoryError {
    IdempotencyRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> IdempotencyRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::ConnectionLost => {
            IdempotencyRepositoryError::connection("database connection error")
        }
        failure => IdempotencyRepositoryError::query(failure.message()),
    }
}

/// Oldest `created_at` that survives a sweep at `now`.
fn cutoff(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, IdempotencyRepositoryError> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_sub_signed(ttl))
        .ok_or_else(|| IdempotencyRepositoryError::query(format!("TTL out of range: {ttl:?}")))
}

/// Insert a pending row for `claim`; `false` when another request holds it.
pub(super) async fn reserve_claim(
    conn: &mut AsyncPgConnection,
    claim: &IdempotencyClaim,
) -> QueryResult<bool> {
    let pending = serde_json::Value::Null;
    let row = NewIdempotencyKeyRow {
        key: *claim.key.as_uuid(),
        user_id: *claim.user_id.as_uuid(),
        mutation_type: claim.mutation_type.as_str(),
        payload_hash: claim.payload_hash.as_bytes(),
        response_snapshot: &pending,
        created_at: claim.claimed_at,
    };
    let inserted = diesel::insert_into(idempotency_keys::table)
        .values(&row)
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;
    Ok(inserted == 1)
}

/// Store the replayable response of a reserved claim.
pub(super) async fn complete_claim(
    conn: &mut AsyncPgConnection,
    record: &IdempotencyRecord,
) -> QueryResult<()> {
    let primary_key = (
        *record.key.as_uuid(),
        *record.user_id.as_uuid(),
        record.mutation_type.as_str(),
    );
    diesel::update(idempotency_keys::table.find(primary_key))
        .set(idempotency_keys::response_snapshot.eq(&record.response_snapshot))
        .execute(conn)
        .await?;
    Ok(())
}

fn decode_row(row: IdempotencyKeyRow) -> Result<IdempotencyRecord, IdempotencyRepositoryError> {
    let corrupt = |what: &str, err: &dyn std::fmt::Display| {
        IdempotencyRepositoryError::serialization(format!("stored {what} is unreadable: {err}"))
    };
    Ok(IdempotencyRecord {
        key: IdempotencyKey::from_uuid(row.key),
        mutation_type: MutationType::from_str(&row.mutation_type)
            .map_err(|err| corrupt("mutation type", &err))?,
        payload_hash: PayloadHash::try_from_bytes(&row.payload_hash)
            .map_err(|err| corrupt("payload hash", &err))?,
        response_snapshot: row.response_snapshot,
        user_id: UserId::from_uuid(row.user_id),
        created_at: row.created_at,
    })
}

#[async_trait]
impl IdempotencyRepository for DieselIdempotencyRepository {
    async fn lookup(
        &self,
        query: &IdempotencyLookupQuery,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let primary_key = (
            *query.key.as_uuid(),
            *query.user_id.as_uuid(),
            query.mutation_type.as_str(),
        );
        let row = idempotency_keys::table
            .find(primary_key)
            .select(IdempotencyKeyRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(query.classify(row.map(decode_row).transpose()?))
    }

    async fn cleanup_expired(&self, ttl: Duration) -> Result<u64, IdempotencyRepositoryError> {
        let cutoff = cutoff(self.clock.utc(), ttl)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let stale = idempotency_keys::table.filter(idempotency_keys::created_at.lt(cutoff));
        let deleted = diesel::delete(stale)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        debug!(deleted, %cutoff, "pruned idempotency records");
        Ok(u64::try_from(deleted).unwrap_or(u64::MAX))
    }
}
