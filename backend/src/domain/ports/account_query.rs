//! Driving port for reading account details.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Coins, EmailAddress, Error, User, UserId, UserName, UserRole};

/// Public view of an account. The password digest is never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: UserName,
    pub email: EmailAddress,
    pub coin_balance: Coins,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            coin_balance: user.coin_balance,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    async fn profile(&self, user_id: &UserId) -> Result<UserProfile, Error>;
}
