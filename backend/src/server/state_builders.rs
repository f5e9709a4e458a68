//! Builders wiring Diesel, RAWG and security adapters into HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use storefront::domain::ports::TokenService;
use storefront::domain::{
    AccountService, CatalogService, HousekeepingService, RandomGamePricer, RechargeService,
    TransactionService, seed_admin,
};
use storefront::inbound::http::state::{HttpState, HttpStatePorts};
use storefront::outbound::persistence::{
    DbPool, DieselGameCatalog, DieselIdempotencyRepository, DieselRechargeLedger,
    DieselTransactionLedger, DieselUserDirectory,
};
use storefront::outbound::rawg::RawgHttpSource;
use storefront::outbound::security::{HmacTokenService, Pbkdf2PasswordHasher};

use super::ServerConfig;

/// Sweep service over the Diesel ledger and idempotency store.
pub(crate) type DieselHousekeeping =
    HousekeepingService<DieselTransactionLedger, DieselIdempotencyRepository>;

/// Adapters shared by every use-case service.
struct Adapters {
    users: Arc<DieselUserDirectory>,
    games: Arc<DieselGameCatalog>,
    ledger: Arc<DieselTransactionLedger>,
    recharges: Arc<DieselRechargeLedger>,
    idempotency: Arc<DieselIdempotencyRepository>,
}

impl Adapters {
    fn new(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserDirectory::new(pool.clone())),
            games: Arc::new(DieselGameCatalog::new(pool.clone())),
            ledger: Arc::new(DieselTransactionLedger::new(pool.clone())),
            recharges: Arc::new(DieselRechargeLedger::new(pool.clone())),
            idempotency: Arc::new(DieselIdempotencyRepository::new(pool.clone())),
        }
    }
}

fn build_feed(config: &ServerConfig) -> std::io::Result<RawgHttpSource> {
    let rawg = &config.rawg;
    if rawg.api_key.is_empty() {
        tracing::warn!("RAWG API key not configured; catalog sync will be rejected upstream");
    }
    RawgHttpSource::new(rawg.endpoint.clone(), rawg.api_key.clone(), rawg.timeout)
        .map_err(|err| std::io::Error::other(format!("failed to build RAWG client: {err}")))
}

/// Construct HTTP state backed by PostgreSQL and the RAWG feed.
///
/// # Errors
///
/// Returns [`std::io::Error`] when the RAWG HTTP client cannot be built.
pub(crate) fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let adapters = Adapters::new(&config.db_pool);
    let tokens = Arc::new(HmacTokenService::new(
        config.token_key.clone(),
        config.token_ttl,
    ));

    let accounts = Arc::new(AccountService::new(
        adapters.users.clone(),
        Arc::new(Pbkdf2PasswordHasher::default()),
        tokens.clone(),
        clock.clone(),
    )
    .with_bootstrap_admin(config.admin_email.clone()));
    let catalog = Arc::new(CatalogService::new(
        adapters.games.clone(),
        Arc::new(build_feed(config)?),
        Arc::new(RandomGamePricer),
    ));
    let transactions = Arc::new(TransactionService::new(
        adapters.users,
        adapters.games,
        adapters.ledger,
        adapters.idempotency.clone(),
        clock.clone(),
    ));
    let recharges = Arc::new(RechargeService::new(
        adapters.recharges,
        adapters.idempotency,
        clock.clone(),
    ));

    let tokens: Arc<dyn TokenService> = tokens;
    Ok(web::Data::new(HttpState::new(
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
        clock,
    )))
}

/// Promote the configured bootstrap administrator if the account exists.
///
/// # Errors
///
/// Returns [`std::io::Error`] when the user directory cannot be reached.
pub(crate) async fn bootstrap_admin(config: &ServerConfig) -> std::io::Result<()> {
    let Some(email) = config.admin_email.as_ref() else {
        return Ok(());
    };
    let users = DieselUserDirectory::new(config.db_pool.clone());
    match seed_admin(&users, email).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => {
            tracing::info!(
                "bootstrap administrator not registered yet; the role is granted at sign-up"
            );
            Ok(())
        }
        Err(err) => Err(std::io::Error::other(format!(
            "failed to bootstrap administrator: {err}"
        ))),
    }
}

pub(crate) fn build_housekeeping(config: &ServerConfig) -> DieselHousekeeping {
    HousekeepingService::new(
        Arc::new(DieselTransactionLedger::new(config.db_pool.clone())),
        Arc::new(DieselIdempotencyRepository::new(config.db_pool.clone())),
        config.idempotency,
        Arc::new(DefaultClock),
    )
}
