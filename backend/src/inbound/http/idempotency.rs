//! `Idempotency-Key` request header.
//!
//! Buy, rent, and recharge handlers take [`IdempotencyHeader`]; a malformed
//! key rejects the request with `400` before the ledger is touched.

use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};
use serde_json::json;

use crate::domain::{Error, IdempotencyKey, IdempotencyKeyValidationError};

/// HTTP header name for idempotency keys.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Optional client-chosen key for safely retrying a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdempotencyHeader(Option<IdempotencyKey>);

impl IdempotencyHeader {
    pub fn into_inner(self) -> Option<IdempotencyKey> {
        self.0
    }
}

fn parse(headers: &HeaderMap) -> Result<Option<IdempotencyKey>, IdempotencyKeyValidationError> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| IdempotencyKeyValidationError::InvalidKey)?;
    IdempotencyKey::new(raw).map(Some)
}

fn reject(err: IdempotencyKeyValidationError) -> Error {
    let (message, code) = match err {
        IdempotencyKeyValidationError::EmptyKey => {
            ("idempotency-key header must not be empty", "empty_key")
        }
        IdempotencyKeyValidationError::InvalidKey => {
            ("idempotency-key header must be a valid uuid", "invalid_key")
        }
    };
    Error::invalid_request(message)
        .with_details(json!({ "header": IDEMPOTENCY_KEY_HEADER, "code": code }))
}

impl FromRequest for IdempotencyHeader {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(parse(req.headers()).map(Self).map_err(reject))
    }
}
