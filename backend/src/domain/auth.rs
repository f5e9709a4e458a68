//! Registration, login, and verified caller identity.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use super::{EmailAddress, UserId, UserName, UserRole, UserValidationError};

/// Shortest password accepted at registration.
pub const PASSWORD_MIN_LENGTH: usize = 6;

/// Validation errors for credential payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsValidationError {
    #[error(transparent)]
    User(#[from] UserValidationError),
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Cleartext password held only for the duration of a request.
///
/// The buffer is wiped on drop and never printed.
#[derive(Clone)]
pub struct PlainPassword(Zeroizing<String>);

impl PlainPassword {
    fn new(raw: String) -> Self {
        Self(Zeroizing::new(raw))
    }

    /// Borrow the password bytes.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainPassword(<redacted>)")
    }
}

/// Validated sign-up request.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: UserName,
    pub email: EmailAddress,
    pub password: PlainPassword,
}

impl Registration {
    /// Validate raw sign-up fields.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::Registration;
    ///
    /// let ok = Registration::try_from_parts("Ada", "ada@example.com", "hunter22".into());
    /// assert!(ok.is_ok());
    /// let short = Registration::try_from_parts("Ada", "ada@example.com", "abc".into());
    /// assert!(short.is_err());
    /// ```
    pub fn try_from_parts(
        name: &str,
        email: &str,
        password: String,
    ) -> Result<Self, CredentialsValidationError> {
        let name = UserName::new(name)?;
        let email = EmailAddress::new(email)?;
        if password.chars().count() < PASSWORD_MIN_LENGTH {
            return Err(CredentialsValidationError::PasswordTooShort {
                min: PASSWORD_MIN_LENGTH,
            });
        }
        Ok(Self {
            name,
            email,
            password: PlainPassword::new(password),
        })
    }
}

/// Validated login request.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub email: EmailAddress,
    pub password: PlainPassword,
}

impl LoginCredentials {
    /// Validate raw login fields.
    pub fn try_from_parts(
        email: &str,
        password: String,
    ) -> Result<Self, CredentialsValidationError> {
        let email = EmailAddress::new(email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: PlainPassword::new(password),
        })
    }
}

/// Caller identity established by a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: UserRole,
}

impl Identity {
    /// Whether the caller may manage the catalog.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Bearer token handed out at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
