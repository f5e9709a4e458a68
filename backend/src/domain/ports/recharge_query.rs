//! Driving port for recharge history.

use async_trait::async_trait;

use crate::domain::{Error, Recharge, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RechargeQuery: Send + Sync {
    /// Recharges of a user, newest first.
    async fn history(&self, user_id: &UserId) -> Result<Vec<Recharge>, Error>;
}
