//! A fully wired storefront backed by in-memory adapters.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use mockable::Clock;

use super::{InMemoryStore, MutableClock, StaticGameFeed};
use crate::domain::ports::{FeedGame, TokenService};
use crate::domain::{
    AccountService, CatalogService, Coins, EmailAddress, FixedGamePricer, Game, GameId,
    HousekeepingService, IdempotencyConfig, Identity, PasswordDigest, RechargeService,
    TransactionService, User, UserId, UserName, UserRole,
};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::security::{HmacTokenService, Pbkdf2PasswordHasher, TokenSigningKey};

/// Price given to games imported through the static feed.
pub const IMPORTED_TEST_PRICE: Coins = Coins::new(250);

/// Services, store and clock shared by one test.
///
/// # Examples
/// ```
/// use storefront::domain::UserRole;
/// use storefront::test_support::TestStorefront;
///
/// let storefront = TestStorefront::new();
/// let (user_id, _token) = storefront.user_with_token(UserRole::User);
/// assert!(storefront.store.balance_of(&user_id).is_some());
/// ```
pub struct TestStorefront {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<MutableClock>,
    pub feed: Arc<StaticGameFeed>,
    pub tokens: Arc<HmacTokenService>,
}

impl Default for TestStorefront {
    fn default() -> Self {
        Self::new()
    }
}

fn epoch() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).single() {
        Some(instant) => instant,
        None => panic!("fixed test epoch is valid"),
    }
}

impl TestStorefront {
    pub fn new() -> Self {
        Self::with_feed(StaticGameFeed::default())
    }

    /// Storefront whose catalog sync reads from `feed`.
    pub fn with_feed(feed: StaticGameFeed) -> Self {
        let clock = Arc::new(MutableClock::new(epoch()));
        let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
        let tokens = Arc::new(HmacTokenService::new(
            TokenSigningKey::from_bytes(vec![0x5a; 32]),
            Duration::hours(24),
        ));
        Self {
            store,
            clock,
            feed: Arc::new(feed),
            tokens,
        }
    }

    fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// HTTP state wired to real services over the in-memory store.
    pub fn state(&self) -> HttpState {
        let accounts = Arc::new(AccountService::new(
            self.store.clone(),
            Arc::new(Pbkdf2PasswordHasher::new(1)),
            self.tokens.clone(),
            self.clock(),
        ));
        let catalog = Arc::new(CatalogService::new(
            self.store.clone(),
            self.feed.clone(),
            Arc::new(FixedGamePricer(IMPORTED_TEST_PRICE)),
        ));
        let transactions = Arc::new(TransactionService::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.clock(),
        ));
        let recharges = Arc::new(RechargeService::new(
            self.store.clone(),
            self.store.clone(),
            self.clock(),
        ));
        let tokens: Arc<dyn TokenService> = self.tokens.clone();

        HttpState::new(
            HttpStatePorts {
                accounts: accounts.clone(),
                profiles: accounts,
                catalog: catalog.clone(),
                catalog_admin: catalog,
                transactions: transactions.clone(),
                library: transactions,
                recharges: recharges.clone(),
                recharge_history: recharges,
            },
            tokens,
            self.clock(),
        )
    }

    /// Sweep service over the same store and clock.
    pub fn housekeeping(&self) -> HousekeepingService<InMemoryStore, InMemoryStore> {
        HousekeepingService::new(
            self.store.clone(),
            self.store.clone(),
            IdempotencyConfig::default(),
            self.clock(),
        )
    }

    /// Insert a user with `role` and the starting balance.
    pub fn user(&self, role: UserRole) -> UserId {
        let suffix = GameId::random().to_string();
        let local = format!("user-{}", &suffix[..8]);
        let name = UserName::new(&local).unwrap_or_else(|err| panic!("test user name: {err}"));
        let email = EmailAddress::new(format!("{local}@example.com"))
            .unwrap_or_else(|err| panic!("test user email: {err}"));
        let mut user = User::register(name, email, PasswordDigest::new("unused"), self.clock.utc());
        user.role = role;
        let id = user.id.clone();
        self.store.insert_user(user);
        id
    }

    /// Insert a user and mint a bearer token for them.
    pub fn user_with_token(&self, role: UserRole) -> (UserId, String) {
        let user_id = self.user(role);
        let token = self.token_for(&user_id, role);
        (user_id, token)
    }

    pub fn token_for(&self, user_id: &UserId, role: UserRole) -> String {
        let identity = Identity {
            user_id: user_id.clone(),
            role,
        };
        match self.tokens.issue(&identity, self.clock.utc()) {
            Ok(issued) => issued.token,
            Err(error) => panic!("issue test token: {error}"),
        }
    }

    /// Insert a catalog game with `price`.
    pub fn game(&self, name: &str, price: u64) -> GameId {
        let game = Game {
            id: GameId::random(),
            rawg_id: None,
            name: name.to_owned(),
            description: format!("{name} description"),
            image_url: format!("https://img.example/{}.jpg", name.to_lowercase()),
            genres: vec!["Action".to_owned()],
            platforms: vec!["PC".to_owned()],
            rating: 4.0,
            price: Coins::new(price),
        };
        let id = game.id;
        self.store.insert_game(game);
        id
    }
}

/// Feed entry for sync tests.
pub fn feed_game(rawg_id: i64, name: &str) -> FeedGame {
    FeedGame {
        rawg_id,
        name: name.to_owned(),
        image_url: Some(format!("https://media.rawg.io/{rawg_id}.jpg")),
        rating: 3.5,
        genres: vec!["Indie".to_owned()],
        platforms: vec!["PC".to_owned()],
    }
}
