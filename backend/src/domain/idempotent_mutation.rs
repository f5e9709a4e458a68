//! Shared orchestration for idempotent coin-moving mutations.

use std::future::Future;

use mockable::Clock;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::Error;
use crate::domain::UserId;
use crate::domain::idempotency::{
    IdempotencyClaim, IdempotencyKey, IdempotencyLookupQuery, IdempotencyLookupResult,
    MutationType, PayloadHash, canonicalize_and_hash,
};
use crate::domain::ports::{IdempotencyRepository, IdempotencyRepositoryError};

pub(crate) fn map_idempotency_error(error: IdempotencyRepositoryError) -> Error {
    match error {
        IdempotencyRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("idempotency repository unavailable: {message}"))
        }
        IdempotencyRepositoryError::Query { message } => {
            Error::internal(format!("idempotency repository error: {message}"))
        }
        IdempotencyRepositoryError::Serialization { message } => Error::internal(format!(
            "idempotency repository serialization failed: {message}"
        )),
    }
}

/// Error for a ledger write that lost its idempotency claim to another request.
pub(crate) fn key_claimed(key: &str) -> Error {
    Error::conflict(format!(
        "idempotency key {key} is in use by a concurrent request"
    ))
}

fn hash_payload(payload: &Value) -> Result<PayloadHash, Error> {
    canonicalize_and_hash(payload)
        .map_err(|err| Error::internal(format!("failed to hash idempotency payload: {err}")))
}

fn deserialize_snapshot<T: DeserializeOwned>(snapshot: Value) -> Result<T, Error> {
    serde_json::from_value(snapshot)
        .map_err(|err| Error::internal(format!("failed to deserialize response: {err}")))
}

fn key_reused() -> Error {
    Error::conflict("idempotency key already used with different payload")
}

/// Inputs identifying one idempotent mutation.
pub(crate) struct IdempotentMutation {
    pub(crate) idempotency_key: Option<IdempotencyKey>,
    pub(crate) user_id: UserId,
    pub(crate) mutation_type: MutationType,
    /// Request fields that must match on replay.
    pub(crate) payload: Value,
}

/// Run `operation` at most once per idempotency key.
///
/// Returns the receipt and whether it was replayed from storage. Without a
/// key the operation runs with no claim. With one, the operation must hand
/// the claim to the ledger write so the record commits with the mutation.
/// A failed operation looks the key up once more: if a concurrent request
/// with the same key committed meanwhile, its receipt is replayed instead.
pub(crate) async fn run_idempotent_mutation<I, T, F, Fut>(
    repo: &I,
    clock: &dyn Clock,
    mutation: IdempotentMutation,
    operation: F,
) -> Result<(T, bool), Error>
where
    I: IdempotencyRepository + ?Sized,
    T: DeserializeOwned,
    F: FnOnce(Option<IdempotencyClaim>) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let IdempotentMutation {
        idempotency_key,
        user_id,
        mutation_type,
        payload,
    } = mutation;

    let Some(idempotency_key) = idempotency_key else {
        return operation(None).await.map(|receipt| (receipt, false));
    };

    let query = IdempotencyLookupQuery::new(
        idempotency_key,
        user_id,
        mutation_type,
        hash_payload(&payload)?,
    );

    if let Some(stored) = stored_outcome(repo, &query).await? {
        return stored;
    }
    match operation(Some(query.claim(clock.utc()))).await {
        Ok(receipt) => Ok((receipt, false)),
        Err(error) => match stored_outcome(repo, &query).await {
            Ok(Some(stored)) => stored,
            Ok(None) | Err(_) => Err(error),
        },
    }
}

/// Replay or reject from a stored record; `None` when the key is unseen.
async fn stored_outcome<I, T>(
    repo: &I,
    query: &IdempotencyLookupQuery,
) -> Result<Option<Result<(T, bool), Error>>, Error>
where
    I: IdempotencyRepository + ?Sized,
    T: DeserializeOwned,
{
    match repo.lookup(query).await.map_err(map_idempotency_error)? {
        IdempotencyLookupResult::NotFound => Ok(None),
        IdempotencyLookupResult::MatchingPayload(record) => {
            tracing::debug!(
                key = %query.key,
                mutation = %query.mutation_type,
                "replaying stored response"
            );
            Ok(Some(
                deserialize_snapshot(record.response_snapshot).map(|receipt| (receipt, true)),
            ))
        }
        IdempotencyLookupResult::ConflictingPayload(_) => Ok(Some(Err(key_reused()))),
    }
}
