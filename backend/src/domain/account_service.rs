//! Registration, login, profile lookups, and admin promotion.
//!
//! A deployment bootstraps its first administrator through a configured
//! email address: the account registered under it is created as an admin,
//! and [`seed_admin`] promotes it at startup if it already exists. Every
//! later promotion goes through an existing admin.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    AccountCommand, AccountQuery, PasswordHasher, PasswordHasherError, TokenError, TokenService,
    UserDirectory, UserProfile,
};
use crate::domain::transaction_service::map_user_directory_error;
use crate::domain::{
    EmailAddress, Error, Identity, IssuedToken, LoginCredentials, Registration, User, UserId,
    UserRole,
};

fn map_hasher_error(error: PasswordHasherError) -> Error {
    Error::internal(format!("password hasher error: {error}"))
}

fn map_token_error(error: TokenError) -> Error {
    Error::internal(format!("token issuance failed: {error}"))
}

fn bad_credentials() -> Error {
    Error::unauthorized("invalid email or password")
}

fn unknown_user(user_id: &UserId) -> Error {
    Error::not_found(format!("user {user_id} not found"))
}

/// Grant the admin role to the account registered under `email`.
///
/// Returns `None` when nobody has registered with that address yet.
///
/// # Errors
///
/// Returns `service_unavailable` or `internal` errors from the directory.
pub async fn seed_admin<U: UserDirectory>(
    users: &U,
    email: &EmailAddress,
) -> Result<Option<UserProfile>, Error> {
    let Some(user) = users
        .find_by_email(email)
        .await
        .map_err(map_user_directory_error)?
    else {
        return Ok(None);
    };
    if user.role == UserRole::Admin {
        return Ok(Some(UserProfile::from(user)));
    }
    let promoted = users
        .set_role(&user.id, UserRole::Admin)
        .await
        .map_err(map_user_directory_error)?;
    if let Some(admin) = promoted.as_ref() {
        info!(user_id = %admin.id, "bootstrap administrator promoted");
    }
    Ok(promoted.map(UserProfile::from))
}
/// Account service implementing the account driving ports.
#[derive(Clone)]
pub struct AccountService<U, H, T> {
    users: Arc<U>,
    hasher: Arc<H>,
    tokens: Arc<T>,
    clock: Arc<dyn Clock>,
    bootstrap_admin: Option<EmailAddress>,
}

impl<U, H, T> AccountService<U, H, T> {
    pub fn new(users: Arc<U>, hasher: Arc<H>, tokens: Arc<T>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            hasher,
            tokens,
            clock,
            bootstrap_admin: None,
        }
    }

    /// Register the account with this email as an administrator.
    #[must_use]
    pub fn with_bootstrap_admin(mut self, email: Option<EmailAddress>) -> Self {
        self.bootstrap_admin = email;
        self
    }
}

#[async_trait]
impl<U, H, T> AccountCommand for AccountService<U, H, T>
where
    U: UserDirectory,
    H: PasswordHasher,
    T: TokenService,
{
    async fn register(&self, registration: Registration) -> Result<UserProfile, Error> {
        let Registration {
            name,
            email,
            password,
        } = registration;
        let digest = self
            .hasher
            .hash(&password)
            .await
            .map_err(map_hasher_error)?;
        let mut user = User::register(name, email, digest, self.clock.utc());
        if self.bootstrap_admin.as_ref() == Some(&user.email) {
            user.role = UserRole::Admin;
        }
        self.users
            .create(&user)
            .await
            .map_err(map_user_directory_error)?;
        info!(user_id = %user.id, role = user.role.as_str(), "account registered");
        Ok(UserProfile::from(user))
    }

    async fn login(&self, credentials: LoginCredentials) -> Result<IssuedToken, Error> {
        let Some(user) = self
            .users
            .find_by_email(&credentials.email)
            .await
            .map_err(map_user_directory_error)?
        else {
            warn!("login attempted for unknown email");
            return Err(bad_credentials());
        };

        let matches = self
            .hasher
            .verify(&credentials.password, &user.password)
            .await
            .map_err(map_hasher_error)?;
        if !matches {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(bad_credentials());
        }

        let identity = Identity {
            user_id: user.id,
            role: user.role,
        };
        let token = self
            .tokens
            .issue(&identity, self.clock.utc())
            .map_err(map_token_error)?;
        info!(
            user_id = %identity.user_id,
            expires_at = %token.expires_at,
            "token issued"
        );
        Ok(token)
    }

    async fn promote(&self, user_id: &UserId) -> Result<UserProfile, Error> {
        let promoted = self
            .users
            .set_role(user_id, UserRole::Admin)
            .await
            .map_err(map_user_directory_error)?
            .ok_or_else(|| unknown_user(user_id))?;
        info!(user_id = %promoted.id, "account promoted to admin");
        Ok(UserProfile::from(promoted))
    }
}

#[async_trait]
impl<U, H, T> AccountQuery for AccountService<U, H, T>
where
    U: UserDirectory,
    H: PasswordHasher,
    T: TokenService,
{
    async fn profile(&self, user_id: &UserId) -> Result<UserProfile, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_directory_error)?
            .map(UserProfile::from)
            .ok_or_else(|| unknown_user(user_id))
    }
}
