//! Driven port for bearer tokens.

use chrono::{DateTime, Utc};

use crate::domain::{Identity, IssuedToken};

use super::define_port_error;

define_port_error! {
    /// Reasons a bearer token is refused or cannot be minted.
    pub enum TokenError {
        Malformed { message: String } => "token is malformed: {message}",
        BadSignature => "token signature does not match",
        Expired => "token has expired",
        Signing { message: String } => "token could not be signed: {message}",
    }
}

/// Issues and verifies bearer credentials.
///
/// Verification is the only trust boundary: once a token verifies, the
/// returned [`Identity`] is passed to services without further checks.
#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken, TokenError>;

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError>;
}
