//! Driving port for buying and renting games.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::idempotency::IdempotencyKey;
use crate::domain::{Coins, Error, GameId, Purchase, Rental, UserId};

/// Buy or rent request from an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameTransactionRequest {
    pub user_id: UserId,
    pub game_id: GameId,
    /// Optional key making retries safe.
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Outcome of a successful purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub purchase: Purchase,
    /// Balance left after the debit.
    pub balance: Coins,
}

/// Outcome of a successful rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalReceipt {
    pub rental: Rental,
    /// Balance left after the debit.
    pub balance: Coins,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyGameResponse {
    pub receipt: PurchaseReceipt,
    /// Whether the receipt was replayed from an earlier request.
    pub replayed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentGameResponse {
    pub receipt: RentalReceipt,
    /// Whether the receipt was replayed from an earlier request.
    pub replayed: bool,
}

/// Coin-spending operations.
///
/// Both operations fail with `not_found` for an unknown user or game and with
/// `insufficient_funds` when the balance does not cover the amount. A failed
/// call leaves the balance and the ledger unchanged.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionCommand: Send + Sync {
    /// Debit the game's price and record a permanent purchase.
    async fn buy(&self, request: GameTransactionRequest) -> Result<BuyGameResponse, Error>;

    /// Debit a tenth of the game's price and record a three-day rental.
    async fn rent(&self, request: GameTransactionRequest) -> Result<RentGameResponse, Error>;
}
