//! Buying, renting, and reading the transaction ledger.
//!
//! The service reads the user and game first so the common failures
//! (unknown ids, an obviously short balance) are reported without touching
//! the ledger. The ledger adapter then re-checks the balance inside the same
//! store transaction as the insert, which is what actually prevents
//! overspending under concurrent requests.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::idempotency::{IdempotencyClaim, MutationType};
use crate::domain::idempotent_mutation::{IdempotentMutation, key_claimed, run_idempotent_mutation};
use crate::domain::ports::{
    BuyGameResponse, GameCatalog, GameCatalogError, GameTransactionRequest, IdempotencyRepository,
    PurchaseReceipt, RentGameResponse, RentalReceipt, TransactionCommand, TransactionLedger,
    TransactionLedgerError, TransactionQuery, UserDirectory, UserDirectoryError,
};
use crate::domain::{
    Coins, Error, Game, GameId, OwnedGame, Purchase, PurchasedGame, Rental, RentalCheck,
    RentedGame, User, UserId, purchase_history, referenced_game_ids, rental_history,
    resolve_entitlements,
};

pub(crate) fn map_user_directory_error(error: UserDirectoryError) -> Error {
    match error {
        UserDirectoryError::Connection { message } => {
            Error::service_unavailable(format!("user directory unavailable: {message}"))
        }
        UserDirectoryError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
        UserDirectoryError::DuplicateEmail { email } => {
            Error::conflict(format!("email {email} is already registered"))
        }
    }
}

pub(crate) fn map_game_catalog_error(error: GameCatalogError) -> Error {
    match error {
        GameCatalogError::Connection { message } => {
            Error::service_unavailable(format!("game catalog unavailable: {message}"))
        }
        GameCatalogError::Query { message } => {
            Error::internal(format!("game catalog error: {message}"))
        }
    }
}

pub(crate) fn map_ledger_error(error: TransactionLedgerError) -> Error {
    match error {
        TransactionLedgerError::Connection { message } => {
            Error::service_unavailable(format!("transaction ledger unavailable: {message}"))
        }
        TransactionLedgerError::Query { message } => {
            Error::internal(format!("transaction ledger error: {message}"))
        }
        TransactionLedgerError::UserNotFound { user_id } => {
            Error::not_found(format!("user {user_id} not found"))
        }
        TransactionLedgerError::InsufficientFunds {
            required,
            available,
        } => insufficient_funds(Coins::new(required), Coins::new(available)),
        TransactionLedgerError::KeyClaimed { key } => key_claimed(&key),
    }
}

fn insufficient_funds(required: Coins, available: Coins) -> Error {
    Error::insufficient_funds("not enough coins").with_details(json!({
        "required": required,
        "available": available,
    }))
}

/// Transaction service implementing the transaction driving ports.
#[derive(Clone)]
pub struct TransactionService<U, G, L, I> {
    users: Arc<U>,
    games: Arc<G>,
    ledger: Arc<L>,
    idempotency: Arc<I>,
    clock: Arc<dyn Clock>,
}

impl<U, G, L, I> TransactionService<U, G, L, I> {
    pub fn new(
        users: Arc<U>,
        games: Arc<G>,
        ledger: Arc<L>,
        idempotency: Arc<I>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            games,
            ledger,
            idempotency,
            clock,
        }
    }
}

impl<U, G, L, I> TransactionService<U, G, L, I>
where
    U: UserDirectory,
    G: GameCatalog,
    L: TransactionLedger,
    I: IdempotencyRepository,
{
    async fn load_user(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_directory_error)?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))
    }

    async fn load_game(&self, game_id: &GameId) -> Result<Game, Error> {
        self.games
            .find_by_id(game_id)
            .await
            .map_err(map_game_catalog_error)?
            .ok_or_else(|| Error::not_found(format!("game {game_id} not found")))
    }

    async fn load_referenced_games(&self, ids: &[GameId]) -> Result<Vec<Game>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.games
            .find_many(ids)
            .await
            .map_err(map_game_catalog_error)
    }

    async fn load_purchases(&self, user_id: &UserId) -> Result<Vec<Purchase>, Error> {
        self.ledger
            .purchases_for_user(user_id)
            .await
            .map_err(map_ledger_error)
    }

    async fn load_rentals(&self, user_id: &UserId) -> Result<Vec<Rental>, Error> {
        self.ledger
            .rentals_for_user(user_id)
            .await
            .map_err(map_ledger_error)
    }

    async fn perform_buy(
        &self,
        user_id: &UserId,
        game_id: &GameId,
        claim: Option<IdempotencyClaim>,
    ) -> Result<PurchaseReceipt, Error> {
        let user = self.load_user(user_id).await?;
        let game = self.load_game(game_id).await?;
        if !user.coin_balance.covers(game.price) {
            return Err(insufficient_funds(game.price, user.coin_balance));
        }

        let purchase = Purchase::new(user.id, &game, self.clock.utc());
        let balance = self
            .ledger
            .record_purchase(&purchase, claim.as_ref())
            .await
            .map_err(map_ledger_error)?;
        info!(
            user_id = %purchase.user_id,
            game_id = %purchase.game_id,
            price = %purchase.price,
            balance = %balance,
            "game purchased"
        );
        Ok(PurchaseReceipt { purchase, balance })
    }

    async fn perform_rent(
        &self,
        user_id: &UserId,
        game_id: &GameId,
        claim: Option<IdempotencyClaim>,
    ) -> Result<RentalReceipt, Error> {
        let user = self.load_user(user_id).await?;
        let game = self.load_game(game_id).await?;
        let fee = game.price.rental_fee();
        if !user.coin_balance.covers(fee) {
            return Err(insufficient_funds(fee, user.coin_balance));
        }

        let rental = Rental::start(user.id, &game, self.clock.utc());
        let balance = self
            .ledger
            .record_rental(&rental, claim.as_ref())
            .await
            .map_err(map_ledger_error)?;
        info!(
            user_id = %rental.user_id,
            game_id = %rental.game_id,
            fee = %rental.fee,
            expire_at = %rental.expire_at,
            balance = %balance,
            "game rented"
        );
        Ok(RentalReceipt { rental, balance })
    }

    fn mutation(request: &GameTransactionRequest, mutation_type: MutationType) -> IdempotentMutation {
        IdempotentMutation {
            idempotency_key: request.idempotency_key.clone(),
            user_id: request.user_id.clone(),
            mutation_type,
            payload: json!({ "gameId": request.game_id }),
        }
    }
}

#[async_trait]
impl<U, G, L, I> TransactionCommand for TransactionService<U, G, L, I>
where
    U: UserDirectory,
    G: GameCatalog,
    L: TransactionLedger,
    I: IdempotencyRepository,
{
    async fn buy(&self, request: GameTransactionRequest) -> Result<BuyGameResponse, Error> {
        let (receipt, replayed) = run_idempotent_mutation(
            self.idempotency.as_ref(),
            self.clock.as_ref(),
            Self::mutation(&request, MutationType::Purchase),
            |claim| self.perform_buy(&request.user_id, &request.game_id, claim),
        )
        .await?;
        Ok(BuyGameResponse { receipt, replayed })
    }

    async fn rent(&self, request: GameTransactionRequest) -> Result<RentGameResponse, Error> {
        let (receipt, replayed) = run_idempotent_mutation(
            self.idempotency.as_ref(),
            self.clock.as_ref(),
            Self::mutation(&request, MutationType::Rental),
            |claim| self.perform_rent(&request.user_id, &request.game_id, claim),
        )
        .await?;
        Ok(RentGameResponse { receipt, replayed })
    }
}

#[async_trait]
impl<U, G, L, I> TransactionQuery for TransactionService<U, G, L, I>
where
    U: UserDirectory,
    G: GameCatalog,
    L: TransactionLedger,
    I: IdempotencyRepository,
{
    async fn check_active_rental(
        &self,
        user_id: &UserId,
        game_id: &GameId,
    ) -> Result<RentalCheck, Error> {
        let rental = self
            .ledger
            .latest_active_rental(user_id, game_id)
            .await
            .map_err(map_ledger_error)?;
        Ok(RentalCheck::evaluate(rental.as_ref(), self.clock.utc()))
    }

    async fn list_purchases(&self, user_id: &UserId) -> Result<Vec<PurchasedGame>, Error> {
        let purchases = self.load_purchases(user_id).await?;
        let ids = referenced_game_ids(&purchases, &[]);
        let games = self.load_referenced_games(&ids).await?;
        Ok(purchase_history(&purchases, &games))
    }

    async fn list_rentals(&self, user_id: &UserId) -> Result<Vec<RentedGame>, Error> {
        let rentals = self.load_rentals(user_id).await?;
        let ids = referenced_game_ids(&[], &rentals);
        let games = self.load_referenced_games(&ids).await?;
        Ok(rental_history(&rentals, &games, self.clock.utc()))
    }

    async fn user_games(&self, user_id: &UserId) -> Result<Vec<OwnedGame>, Error> {
        let purchases = self.load_purchases(user_id).await?;
        let rentals = self.load_rentals(user_id).await?;
        let ids = referenced_game_ids(&purchases, &rentals);
        let games = self.load_referenced_games(&ids).await?;
        Ok(resolve_entitlements(&purchases, &rentals, &games))
    }
}

#[cfg(test)]
#[path = "transaction_service_tests.rs"]
mod tests;
