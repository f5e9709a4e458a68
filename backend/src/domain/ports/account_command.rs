//! Driving port for sign-up, login, and role changes.

use async_trait::async_trait;

use crate::domain::{Error, IssuedToken, LoginCredentials, Registration, UserId};

use super::UserProfile;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create an account with the starting balance.
    ///
    /// Fails with `conflict` when the email is taken.
    async fn register(&self, registration: Registration) -> Result<UserProfile, Error>;

    /// Exchange credentials for a bearer token.
    ///
    /// Unknown emails and wrong passwords both fail with `unauthorized`.
    async fn login(&self, credentials: LoginCredentials) -> Result<IssuedToken, Error>;

    /// Grant the admin role to `user_id`. Promoting an admin is a no-op.
    ///
    /// Callers must already hold the admin role. Fails with `not_found` for
    /// unknown accounts.
    async fn promote(&self, user_id: &UserId) -> Result<UserProfile, Error>;
}
