//! Canonical payload hashing.

use std::fmt;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

const HASH_LEN: usize = 32;

/// Failures while building a [`PayloadHash`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadHashError {
    #[error("payload hash must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("failed to serialise canonical payload: {message}")]
    Serialization { message: String },
}

/// SHA-256 digest of a canonicalised request payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayloadHash([u8; HASH_LEN]);

impl PayloadHash {
    /// Rebuild a hash from stored bytes.
    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, PayloadHashError> {
        let digest: [u8; HASH_LEN] =
            bytes
                .try_into()
                .map_err(|_| PayloadHashError::InvalidLength {
                    expected: HASH_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(digest))
    }

    /// Wrap a digest array.
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PayloadHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash `value` after sorting object keys recursively.
///
/// Array order is significant; whitespace and key order are not.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use storefront::domain::idempotency::canonicalize_and_hash;
///
/// let a = canonicalize_and_hash(&json!({"gameId": "g", "amount": 1})).expect("hash");
/// let b = canonicalize_and_hash(&json!({"amount": 1, "gameId": "g"})).expect("hash");
/// assert_eq!(a, b);
/// ```
pub fn canonicalize_and_hash(value: &Value) -> Result<PayloadHash, PayloadHashError> {
    let bytes =
        serde_json::to_vec(&canonicalize(value)).map_err(|err| PayloadHashError::Serialization {
            message: err.to_string(),
        })?;
    Ok(PayloadHash(Sha256::digest(&bytes).into()))
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect::<Map<_, _>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        scalar => scalar.clone(),
    }
}
