//! In-memory driven adapters.
//!
//! [`InMemoryStore`] implements every storage port against one mutex-guarded
//! state, so a single `Arc<InMemoryStore>` can back all services in an
//! integration test. Idempotency claims, balance checks, and ledger appends
//! happen under the same lock, mirroring the single transaction the SQL
//! adapters use.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::{Clock, DefaultClock};

use crate::domain::idempotency::{
    IdempotencyClaim, IdempotencyLookupQuery, IdempotencyLookupResult, IdempotencyRecord,
};
use crate::domain::ports::{
    FeedGame, FeedPage, GameCatalog, GameCatalogError, GameFeed, GameFeedError, GameListing,
    IdempotencyRepository, IdempotencyRepositoryError, PurchaseReceipt, RechargeLedger,
    RechargeLedgerError, RechargeReceipt, RentalReceipt, TransactionLedger,
    TransactionLedgerError, UserDirectory, UserDirectoryError,
};
use crate::domain::{
    Coins, EmailAddress, Game, GameId, PageRequest, Purchase, Recharge, Rental, RentalStatus,
    User, UserId, UserRole,
};

#[derive(Default)]
struct StoreState {
    users: Vec<User>,
    games: Vec<Game>,
    purchases: Vec<Purchase>,
    rentals: Vec<Rental>,
    recharges: Vec<Recharge>,
    idempotency: Vec<IdempotencyRecord>,
}

impl StoreState {
    fn user_mut(&mut self, id: &UserId) -> Option<&mut User> {
        self.users.iter_mut().find(|user| &user.id == id)
    }

    fn is_claimed(&self, claim: &IdempotencyClaim) -> bool {
        self.idempotency.iter().any(|record| {
            record.key == claim.key
                && record.user_id == claim.user_id
                && record.mutation_type == claim.mutation_type
        })
    }
}

/// Storage for users, games, the ledger, and idempotency records.
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }

    /// Use `clock` when ageing idempotency records.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            clock,
        }
    }

    pub fn insert_user(&self, user: User) {
        self.lock().users.push(user);
    }

    pub fn insert_game(&self, game: Game) {
        self.lock().games.push(game);
    }

    /// Current balance of `user_id`, if the user exists.
    pub fn balance_of(&self, user_id: &UserId) -> Option<Coins> {
        self.lock()
            .users
            .iter()
            .find(|user| &user.id == user_id)
            .map(|user| user.coin_balance)
    }

    /// Every stored rental, for assertions on the status hint.
    pub fn rentals(&self) -> Vec<Rental> {
        self.lock().rentals.clone()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("in-memory store mutex"),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserDirectoryError> {
        Ok(self.lock().users.iter().find(|user| &user.id == id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserDirectoryError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|user| &user.email == email)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<(), UserDirectoryError> {
        let mut state = self.lock();
        if state.users.iter().any(|existing| existing.email == user.email) {
            return Err(UserDirectoryError::duplicate_email(user.email.to_string()));
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn set_role(
        &self,
        id: &UserId,
        role: UserRole,
    ) -> Result<Option<User>, UserDirectoryError> {
        let mut state = self.lock();
        Ok(state.user_mut(id).map(|user| {
            user.role = role;
            user.clone()
        }))
    }
}

#[async_trait]
impl GameCatalog for InMemoryStore {
    async fn find_by_id(&self, id: &GameId) -> Result<Option<Game>, GameCatalogError> {
        Ok(self.lock().games.iter().find(|game| &game.id == id).cloned())
    }

    async fn find_many(&self, ids: &[GameId]) -> Result<Vec<Game>, GameCatalogError> {
        Ok(self
            .lock()
            .games
            .iter()
            .filter(|game| ids.contains(&game.id))
            .cloned()
            .collect())
    }

    async fn list(&self, page: PageRequest) -> Result<GameListing, GameCatalogError> {
        let state = self.lock();
        let mut games = state.games.clone();
        games.sort_by(|a, b| a.name.cmp(&b.name));
        let total = u64::try_from(games.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let games = games
            .into_iter()
            .skip(offset)
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .collect();
        Ok(GameListing { games, total })
    }

    async fn create(&self, game: &Game) -> Result<(), GameCatalogError> {
        self.lock().games.push(game.clone());
        Ok(())
    }

    async fn delete(&self, id: &GameId) -> Result<bool, GameCatalogError> {
        let mut state = self.lock();
        let before = state.games.len();
        state.games.retain(|game| &game.id != id);
        Ok(state.games.len() != before)
    }

    async fn insert_if_absent(&self, game: &Game) -> Result<bool, GameCatalogError> {
        let mut state = self.lock();
        let known = game.rawg_id.is_some()
            && state
                .games
                .iter()
                .any(|existing| existing.rawg_id == game.rawg_id);
        if known {
            return Ok(false);
        }
        state.games.push(game.clone());
        Ok(true)
    }
}

/// Balance left after debiting `amount`, without applying it.
fn debit_preview(
    state: &StoreState,
    user_id: &UserId,
    amount: Coins,
) -> Result<Coins, TransactionLedgerError> {
    let user = state
        .users
        .iter()
        .find(|user| &user.id == user_id)
        .ok_or_else(|| TransactionLedgerError::user_not_found(user_id.to_string()))?;
    user.coin_balance.checked_sub(amount).ok_or_else(|| {
        TransactionLedgerError::insufficient_funds(amount.value(), user.coin_balance.value())
    })
}

fn debit(
    state: &mut StoreState,
    user_id: &UserId,
    amount: Coins,
) -> Result<Coins, TransactionLedgerError> {
    let remaining = debit_preview(state, user_id, amount)?;
    if let Some(user) = state.user_mut(user_id) {
        user.coin_balance = remaining;
    }
    Ok(remaining)
}

fn check_claim(
    state: &StoreState,
    claim: Option<&IdempotencyClaim>,
) -> Result<(), TransactionLedgerError> {
    match claim {
        Some(claim) if state.is_claimed(claim) => {
            Err(TransactionLedgerError::key_claimed(claim.key.to_string()))
        }
        _ => Ok(()),
    }
}

fn claim_record<T: serde::Serialize>(
    claim: Option<&IdempotencyClaim>,
    receipt: &T,
) -> Result<Option<IdempotencyRecord>, serde_json::Error> {
    claim.map(|claim| claim.to_record(receipt)).transpose()
}

#[async_trait]
impl TransactionLedger for InMemoryStore {
    async fn record_purchase<'a>(
        &self,
        purchase: &Purchase,
        claim: Option<&'a IdempotencyClaim>,
    ) -> Result<Coins, TransactionLedgerError> {
        let mut state = self.lock();
        check_claim(&state, claim)?;
        let receipt = PurchaseReceipt {
            purchase: purchase.clone(),
            balance: debit_preview(&state, &purchase.user_id, purchase.price)?,
        };
        let record = claim_record(claim, &receipt)
            .map_err(|err| TransactionLedgerError::query(err.to_string()))?;
        let balance = debit(&mut state, &purchase.user_id, purchase.price)?;
        state.purchases.push(purchase.clone());
        state.idempotency.extend(record);
        Ok(balance)
    }

    async fn record_rental<'a>(
        &self,
        rental: &Rental,
        claim: Option<&'a IdempotencyClaim>,
    ) -> Result<Coins, TransactionLedgerError> {
        let mut state = self.lock();
        check_claim(&state, claim)?;
        let receipt = RentalReceipt {
            rental: rental.clone(),
            balance: debit_preview(&state, &rental.user_id, rental.fee)?,
        };
        let record = claim_record(claim, &receipt)
            .map_err(|err| TransactionLedgerError::query(err.to_string()))?;
        let balance = debit(&mut state, &rental.user_id, rental.fee)?;
        state.rentals.push(rental.clone());
        state.idempotency.extend(record);
        Ok(balance)
    }

    async fn purchases_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Purchase>, TransactionLedgerError> {
        Ok(self
            .lock()
            .purchases
            .iter()
            .filter(|purchase| &purchase.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn rentals_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Rental>, TransactionLedgerError> {
        Ok(self
            .lock()
            .rentals
            .iter()
            .filter(|rental| &rental.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn latest_active_rental(
        &self,
        user_id: &UserId,
        game_id: &GameId,
    ) -> Result<Option<Rental>, TransactionLedgerError> {
        Ok(self
            .lock()
            .rentals
            .iter()
            .filter(|rental| {
                &rental.user_id == user_id
                    && &rental.game_id == game_id
                    && rental.stored_status == RentalStatus::Active
            })
            .max_by_key(|rental| rental.expire_at)
            .cloned())
    }

    async fn mark_expired_rentals(&self, now: DateTime<Utc>) -> Result<u64, TransactionLedgerError> {
        let mut state = self.lock();
        let mut changed = 0;
        for rental in state
            .rentals
            .iter_mut()
            .filter(|rental| rental.stored_status == RentalStatus::Active)
        {
            if !rental.is_active_at(now) {
                rental.stored_status = RentalStatus::Expired;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl RechargeLedger for InMemoryStore {
    async fn record<'a>(
        &self,
        recharge: &Recharge,
        claim: Option<&'a IdempotencyClaim>,
    ) -> Result<Coins, RechargeLedgerError> {
        let mut state = self.lock();
        if let Some(claim) = claim.filter(|claim| state.is_claimed(claim)) {
            return Err(RechargeLedgerError::key_claimed(claim.key.to_string()));
        }
        let user_id = recharge.user_id.to_string();
        let user = state
            .user_mut(&recharge.user_id)
            .ok_or_else(|| RechargeLedgerError::user_not_found(user_id.clone()))?;
        let balance = user
            .coin_balance
            .checked_add(recharge.amount)
            .ok_or_else(|| RechargeLedgerError::balance_overflow(user_id))?;
        let receipt = RechargeReceipt {
            recharge: recharge.clone(),
            balance,
        };
        let record = claim_record(claim, &receipt)
            .map_err(|err| RechargeLedgerError::query(err.to_string()))?;
        user.coin_balance = balance;
        state.recharges.push(recharge.clone());
        state.idempotency.extend(record);
        Ok(balance)
    }

    async fn history(&self, user_id: &UserId) -> Result<Vec<Recharge>, RechargeLedgerError> {
        let mut history: Vec<Recharge> = self
            .lock()
            .recharges
            .iter()
            .filter(|recharge| &recharge.user_id == user_id)
            .cloned()
            .collect();
        history.reverse();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(history)
    }
}

#[async_trait]
impl IdempotencyRepository for InMemoryStore {
    async fn lookup(
        &self,
        query: &IdempotencyLookupQuery,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError> {
        let record = self
            .lock()
            .idempotency
            .iter()
            .find(|record| {
                record.key == query.key
                    && record.user_id == query.user_id
                    && record.mutation_type == query.mutation_type
            })
            .cloned();
        Ok(query.classify(record))
    }

    async fn cleanup_expired(&self, ttl: Duration) -> Result<u64, IdempotencyRepositoryError> {
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|err| IdempotencyRepositoryError::query(err.to_string()))?;
        let cutoff = self.clock.utc() - ttl;
        let mut state = self.lock();
        let before = state.idempotency.len();
        state.idempotency.retain(|record| record.created_at >= cutoff);
        Ok(u64::try_from(before - state.idempotency.len()).unwrap_or(u64::MAX))
    }
}

/// Feed that serves canned pages, one-based.
#[derive(Debug, Clone, Default)]
pub struct StaticGameFeed {
    pages: Vec<Vec<FeedGame>>,
}

impl StaticGameFeed {
    pub fn new(pages: Vec<Vec<FeedGame>>) -> Self {
        Self { pages }
    }
}

#[async_trait]
impl GameFeed for StaticGameFeed {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<FeedPage, GameFeedError> {
        let index = usize::try_from(page.saturating_sub(1))
            .map_err(|err| GameFeedError::invalid_request(err.to_string()))?;
        let take = usize::try_from(page_size).unwrap_or(usize::MAX);
        let games = self
            .pages
            .get(index)
            .map(|games| games.iter().take(take).cloned().collect())
            .unwrap_or_default();
        Ok(FeedPage {
            games,
            has_more: index + 1 < self.pages.len(),
        })
    }
}
