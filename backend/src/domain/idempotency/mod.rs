//! Replay protection for coin-moving requests.
//!
//! Clients may attach an `Idempotency-Key` header to `buy`, `rent` and
//! `recharge` calls. The first successful call stores a response snapshot
//! under `(key, user, mutation)` together with a hash of the request payload,
//! in the same store transaction as the ledger entry it guards.
//! A retry with the same payload replays the snapshot without touching the
//! balance; a retry with a different payload is a conflict.
//!
//! Payloads are canonicalised before hashing (object keys sorted recursively,
//! compact JSON) so key order and whitespace never change the hash.

mod config;
mod key;
mod mutation_type;
mod payload;
mod record;

pub use config::{IDEMPOTENCY_TTL_HOURS_ENV, IdempotencyConfig};
pub use key::{IdempotencyKey, IdempotencyKeyValidationError};
pub use mutation_type::{MutationType, ParseMutationTypeError};
pub use payload::{PayloadHash, PayloadHashError, canonicalize_and_hash};
pub use record::{
    IdempotencyClaim, IdempotencyLookupQuery, IdempotencyLookupResult, IdempotencyRecord,
};
