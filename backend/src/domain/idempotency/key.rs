//! Client-supplied idempotency keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reasons an `Idempotency-Key` header value is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdempotencyKeyValidationError {
    #[error("idempotency key must not be empty")]
    EmptyKey,
    #[error("idempotency key must be a valid UUID")]
    InvalidKey,
}

/// UUID sent in the `Idempotency-Key` header.
///
/// The original text is kept alongside the parsed value so replayed responses
/// echo exactly what the client sent.
///
/// # Examples
/// ```
/// use storefront::domain::idempotency::IdempotencyKey;
///
/// let key = IdempotencyKey::new("550e8400-e29b-41d4-a716-446655440000").expect("uuid");
/// assert_eq!(key.as_ref(), "550e8400-e29b-41d4-a716-446655440000");
/// assert!(IdempotencyKey::new(" 550e8400-e29b-41d4-a716-446655440000").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(Uuid, String);

impl IdempotencyKey {
    /// Parse a key, rejecting blank, padded, or non-UUID input.
    pub fn new(key: impl AsRef<str>) -> Result<Self, IdempotencyKeyValidationError> {
        Self::parse_owned(key.as_ref().to_owned())
    }

    /// Wrap a UUID loaded from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    /// Fresh random key.
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    fn parse_owned(raw: String) -> Result<Self, IdempotencyKeyValidationError> {
        if raw.is_empty() {
            return Err(IdempotencyKeyValidationError::EmptyKey);
        }
        if raw.trim() != raw {
            return Err(IdempotencyKeyValidationError::InvalidKey);
        }
        let uuid = Uuid::parse_str(&raw).map_err(|_| IdempotencyKeyValidationError::InvalidKey)?;
        Ok(Self(uuid, raw))
    }

    /// Parsed UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        &self.1
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.1)
    }
}

impl From<IdempotencyKey> for String {
    fn from(value: IdempotencyKey) -> Self {
        value.1
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdempotencyKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_owned(value)
    }
}
