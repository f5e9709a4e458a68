//! Driving port for reading a user's ledger and entitlements.

use async_trait::async_trait;

use crate::domain::{Error, GameId, OwnedGame, PurchasedGame, RentalCheck, RentedGame, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionQuery: Send + Sync {
    /// Whether the user holds a rental of `game_id` that is live right now.
    async fn check_active_rental(
        &self,
        user_id: &UserId,
        game_id: &GameId,
    ) -> Result<RentalCheck, Error>;

    async fn list_purchases(&self, user_id: &UserId) -> Result<Vec<PurchasedGame>, Error>;

    /// Rentals with the status derived from the current time.
    async fn list_rentals(&self, user_id: &UserId) -> Result<Vec<RentedGame>, Error>;

    /// One entry per distinct game the user bought or rented.
    async fn user_games(&self, user_id: &UserId) -> Result<Vec<OwnedGame>, Error>;
}
