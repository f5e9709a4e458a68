//! Driven port for the purchase and rental ledger.
//!
//! Recording a purchase or rental debits the user's balance in the same store
//! transaction. The debit only applies while the balance covers the amount,
//! so concurrent requests can never take a balance below zero, and a failed
//! insert rolls the debit back. An idempotency claim passed along is written
//! in that transaction too, before the debit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::idempotency::IdempotencyClaim;
use crate::domain::{Coins, GameId, Purchase, Rental, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by transaction ledger adapters.
    pub enum TransactionLedgerError {
        Connection { message: String } => "transaction ledger connection failed: {message}",
        Query { message: String } => "transaction ledger query failed: {message}",
        /// The debited account does not exist.
        UserNotFound { user_id: String } => "user {user_id} does not exist",
        /// The balance at commit time did not cover the debit.
        InsufficientFunds { required: u64, available: u64 } =>
            "balance {available} does not cover {required}",
        /// Another request already holds the idempotency claim.
        KeyClaimed { key: String } => "idempotency key {key} is already claimed",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Debit `purchase.price` and append the purchase atomically.
    ///
    /// With a `claim`, its record (replaying a `PurchaseReceipt`) commits with
    /// the purchase or not at all. Returns the balance left after the debit.
    async fn record_purchase<'a>(
        &self,
        purchase: &Purchase,
        claim: Option<&'a IdempotencyClaim>,
    ) -> Result<Coins, TransactionLedgerError>;

    /// Debit `rental.fee` and append the rental atomically.
    ///
    /// With a `claim`, its record (replaying a `RentalReceipt`) commits with
    /// the rental or not at all. Returns the balance left after the debit.
    async fn record_rental<'a>(
        &self,
        rental: &Rental,
        claim: Option<&'a IdempotencyClaim>,
    ) -> Result<Coins, TransactionLedgerError>;

    /// All purchases of a user in ledger order.
    async fn purchases_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Purchase>, TransactionLedgerError>;

    /// All rentals of a user in ledger order, expired ones included.
    async fn rentals_for_user(&self, user_id: &UserId)
    -> Result<Vec<Rental>, TransactionLedgerError>;

    /// The stored-active rental of `game_id` with the latest expiry, if any.
    async fn latest_active_rental(
        &self,
        user_id: &UserId,
        game_id: &GameId,
    ) -> Result<Option<Rental>, TransactionLedgerError>;

    /// Rewrite the stored status of rentals expired at `now`.
    ///
    /// Returns the number of rows changed.
    async fn mark_expired_rentals(&self, now: DateTime<Utc>) -> Result<u64, TransactionLedgerError>;
}
