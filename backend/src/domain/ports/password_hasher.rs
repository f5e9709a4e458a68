//! Driven port for password hashing.

use async_trait::async_trait;

use crate::domain::{PasswordDigest, PlainPassword};

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashers.
    pub enum PasswordHasherError {
        Hash { message: String } => "password hashing failed: {message}",
        /// A stored digest could not be parsed.
        MalformedDigest { message: String } => "stored password digest is malformed: {message}",
    }
}

/// Key-stretching hash for account passwords.
///
/// Implementations are expected to be slow on purpose and should move work
/// off the async executor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &PlainPassword) -> Result<PasswordDigest, PasswordHasherError>;

    /// Constant-time comparison of `password` against `digest`.
    async fn verify(
        &self,
        password: &PlainPassword,
        digest: &PasswordDigest,
    ) -> Result<bool, PasswordHasherError>;
}
