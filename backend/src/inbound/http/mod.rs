//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

use crate::domain::Error;

pub mod accounts;
pub mod error;
pub mod games;
pub mod health;
pub mod idempotency;
pub mod identity;
pub mod recharges;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod token_config;
pub mod transactions;

pub use error::ApiResult;

/// Register every storefront endpoint except the health probes.
///
/// Handlers read [`state::HttpState`] from app data, so callers must attach
/// it before mounting these routes.
///
/// # Examples
/// ```no_run
/// use actix_web::{App, web};
/// use storefront::inbound::http::{configure, state::HttpState};
///
/// fn app(state: HttpState) {
///     let _app = App::new()
///         .app_data(web::Data::new(state))
///         .configure(configure);
/// }
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("invalid JSON body: {err}")).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("invalid query string: {err}")).into()
    }))
    .service(accounts::register)
    .service(accounts::login)
    .service(accounts::profile)
    .service(accounts::promote_user)
    .service(games::sync_catalog)
    .service(games::list_games)
    .service(games::get_game)
    .service(games::create_game)
    .service(games::delete_game)
    .service(transactions::buy_game)
    .service(transactions::rent_game)
    .service(transactions::check_rental)
    .service(transactions::my_purchases)
    .service(transactions::my_rentals)
    .service(transactions::my_games)
    .service(recharges::recharge)
    .service(recharges::recharge_history);
}
