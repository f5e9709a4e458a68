//! Driving port for topping up balances.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::idempotency::IdempotencyKey;
use crate::domain::{Coins, Error, Recharge, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RechargeRequest {
    pub user_id: UserId,
    /// Requested amount; validated against the minimum by the service.
    pub amount: Coins,
    pub idempotency_key: Option<IdempotencyKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RechargeReceipt {
    pub recharge: Recharge,
    /// Balance after the credit.
    pub balance: Coins,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RechargeResponse {
    pub receipt: RechargeReceipt,
    pub replayed: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RechargeCommand: Send + Sync {
    /// Record a successful recharge and credit the balance atomically.
    async fn recharge(&self, request: RechargeRequest) -> Result<RechargeResponse, Error>;
}
