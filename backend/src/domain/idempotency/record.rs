//! Stored idempotency records and lookups.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::{IdempotencyKey, MutationType, PayloadHash};
use crate::domain::UserId;

/// Response snapshot stored under an idempotency key.
#[derive(Debug, Clone)]
pub struct IdempotencyRecord {
    pub key: IdempotencyKey,
    pub mutation_type: MutationType,
    pub payload_hash: PayloadHash,
    /// Serialised response body replayed on retry.
    pub response_snapshot: Value,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A key a ledger write claims inside its own store transaction.
///
/// The claim is inserted before the balance moves. A second request holding
/// the same claim waits for the first to finish and then finds the key taken,
/// so at most one of them ever debits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyClaim {
    pub key: IdempotencyKey,
    pub user_id: UserId,
    pub mutation_type: MutationType,
    pub payload_hash: PayloadHash,
    pub claimed_at: DateTime<Utc>,
}

impl IdempotencyClaim {
    /// Record replaying `response` for later requests with this claim.
    pub fn to_record<T: Serialize>(
        &self,
        response: &T,
    ) -> Result<IdempotencyRecord, serde_json::Error> {
        Ok(IdempotencyRecord {
            key: self.key.clone(),
            mutation_type: self.mutation_type,
            payload_hash: self.payload_hash.clone(),
            response_snapshot: serde_json::to_value(response)?,
            user_id: self.user_id.clone(),
            created_at: self.claimed_at,
        })
    }
}

/// What the store knows about a key.
#[derive(Debug, Clone)]
pub enum IdempotencyLookupResult {
    NotFound,
    /// Same key, same payload: replay.
    MatchingPayload(IdempotencyRecord),
    /// Same key, different payload: reject.
    ConflictingPayload(IdempotencyRecord),
}

/// Lookup scoped to one user and one mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyLookupQuery {
    pub key: IdempotencyKey,
    pub user_id: UserId,
    pub mutation_type: MutationType,
    pub payload_hash: PayloadHash,
}

impl IdempotencyLookupQuery {
    pub fn new(
        key: IdempotencyKey,
        user_id: UserId,
        mutation_type: MutationType,
        payload_hash: PayloadHash,
    ) -> Self {
        Self {
            key,
            user_id,
            mutation_type,
            payload_hash,
        }
    }

    /// Claim this query's key at `now`.
    pub fn claim(&self, now: DateTime<Utc>) -> IdempotencyClaim {
        IdempotencyClaim {
            key: self.key.clone(),
            user_id: self.user_id.clone(),
            mutation_type: self.mutation_type,
            payload_hash: self.payload_hash.clone(),
            claimed_at: now,
        }
    }

    /// Classify a stored record against this query's payload hash.
    pub fn classify(&self, record: Option<IdempotencyRecord>) -> IdempotencyLookupResult {
        match record {
            None => IdempotencyLookupResult::NotFound,
            Some(record) if record.payload_hash == self.payload_hash => {
                IdempotencyLookupResult::MatchingPayload(record)
            }
            Some(record) => IdempotencyLookupResult::ConflictingPayload(record),
        }
    }
}
