//! Driven port for coin top-ups.

use async_trait::async_trait;

use crate::domain::idempotency::IdempotencyClaim;
use crate::domain::{Coins, Recharge, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by recharge ledger adapters.
    pub enum RechargeLedgerError {
        Connection { message: String } => "recharge ledger connection failed: {message}",
        Query { message: String } => "recharge ledger query failed: {message}",
        UserNotFound { user_id: String } => "user {user_id} does not exist",
        /// The credit would exceed the largest storable balance.
        BalanceOverflow { user_id: String } => "balance of user {user_id} would overflow",
        /// Another request already holds the idempotency claim.
        KeyClaimed { key: String } => "idempotency key {key} is already claimed",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RechargeLedger: Send + Sync {
    /// Append the recharge and credit its amount in one store transaction.
    ///
    /// A `claim` is stored in the same transaction, replaying a
    /// `RechargeReceipt`. Returns the balance after the credit.
    async fn record<'a>(
        &self,
        recharge: &Recharge,
        claim: Option<&'a IdempotencyClaim>,
    ) -> Result<Coins, RechargeLedgerError>;

    /// Recharges of a user, newest first.
    async fn history(&self, user_id: &UserId) -> Result<Vec<Recharge>, RechargeLedgerError>;
}
