//! Driven port for account storage.
//!
//! Balance changes never go through this port. Debits and credits happen
//! inside the ledger transactions that record them, so the directory only
//! reads snapshots, creates accounts, and changes roles.

use async_trait::async_trait;

use crate::domain::{EmailAddress, User, UserId, UserRole};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user directory adapters.
    pub enum UserDirectoryError {
        Connection { message: String } => "user directory connection failed: {message}",
        Query { message: String } => "user directory query failed: {message}",
        /// Another account already uses the email address.
        DuplicateEmail { email: String } => "email {email} is already registered",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserDirectoryError>;

    /// Look up an account by its normalised email address.
    async fn find_by_email(&self, email: &EmailAddress)
    -> Result<Option<User>, UserDirectoryError>;

    /// Insert a new account, failing with `DuplicateEmail` on collision.
    async fn create(&self, user: &User) -> Result<(), UserDirectoryError>;

    /// Set the account's role, returning the updated account or `None` when
    /// no account has `id`.
    async fn set_role(&self, id: &UserId, role: UserRole)
    -> Result<Option<User>, UserDirectoryError>;
}
