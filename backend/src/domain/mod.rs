//! Domain primitives, aggregates, and services.
//!
//! Purpose: define the storefront's strongly typed entities (users, games,
//! purchases, rentals, recharges) and the services that move coins between
//! them. Nothing here knows about HTTP or SQL; adapters reach the domain
//! through [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and stable error identifiers.
//! - Coins: non-negative coin amounts with checked arithmetic.
//! - Purchase / Rental: ledger entries; rental liveness is derived from
//!   `expire_at` at read time.
//! - TransactionService: buy, rent, and ledger views.

pub mod account_service;
pub mod auth;
pub mod catalog_service;
pub mod coins;
pub mod entitlements;
pub mod error;
pub mod game;
pub mod housekeeping;
pub mod idempotency;
pub(crate) mod idempotent_mutation;
pub mod ports;
pub mod pricing;
pub mod purchase;
pub mod recharge;
pub mod recharge_service;
pub mod rental;
pub mod trace_id;
pub mod transaction_service;
pub mod user;

pub use self::account_service::{AccountService, seed_admin};
pub use self::auth::{
    CredentialsValidationError, Identity, IssuedToken, LoginCredentials, PASSWORD_MIN_LENGTH,
    PlainPassword, Registration,
};
pub use self::catalog_service::{CatalogService, IMPORTED_DESCRIPTION};
pub use self::coins::Coins;
pub use self::entitlements::{
    GameSummary, OwnedGame, PurchasedGame, RentedGame, purchase_history, referenced_game_ids,
    rental_history, resolve_entitlements,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::game::{
    DEFAULT_PAGE_LIMIT, Game, GameDraft, GameId, GamePage, GameValidationError, MAX_PAGE_LIMIT,
    PageRequest, RATING_MAX, RATING_MIN,
};
pub use self::housekeeping::{HousekeepingService, SweepReport};
pub use self::idempotency::{IdempotencyConfig, IdempotencyKey, IdempotencyKeyValidationError};
pub use self::pricing::{FixedGamePricer, RandomGamePricer};
pub use self::purchase::Purchase;
pub use self::recharge::{
    MIN_RECHARGE, Recharge, RechargeAmount, RechargeStatus, RechargeValidationError,
};
pub use self::recharge_service::RechargeService;
pub use self::rental::{
    ParseRentalStatusError, RENTAL_WINDOW_DAYS, Rental, RentalCheck, RentalStatus, rental_window,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::transaction_service::TransactionService;
pub use self::user::{
    EmailAddress, PasswordDigest, STARTING_BALANCE, User, UserId, UserName, UserRole,
    UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use storefront::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
