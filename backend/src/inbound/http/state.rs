//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    AccountCommand, AccountQuery, CatalogCommand, CatalogQuery, RechargeCommand, RechargeQuery,
    TokenService, TransactionCommand, TransactionQuery,
};

/// Parameter object bundling the use-case ports called by handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountCommand>,
    pub profiles: Arc<dyn AccountQuery>,
    pub catalog: Arc<dyn CatalogQuery>,
    pub catalog_admin: Arc<dyn CatalogCommand>,
    pub transactions: Arc<dyn TransactionCommand>,
    pub library: Arc<dyn TransactionQuery>,
    pub recharges: Arc<dyn RechargeCommand>,
    pub recharge_history: Arc<dyn RechargeQuery>,
}

/// Dependency bundle for HTTP handlers.
///
/// `tokens` and `clock` back the bearer-token extractors in
/// [`super::identity`]; they are the only pieces not reached through a
/// use-case port.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountCommand>,
    pub profiles: Arc<dyn AccountQuery>,
    pub catalog: Arc<dyn CatalogQuery>,
    pub catalog_admin: Arc<dyn CatalogCommand>,
    pub transactions: Arc<dyn TransactionCommand>,
    pub library: Arc<dyn TransactionQuery>,
    pub recharges: Arc<dyn RechargeCommand>,
    pub recharge_history: Arc<dyn RechargeQuery>,
    pub tokens: Arc<dyn TokenService>,
    pub clock: Arc<dyn Clock>,
}

impl HttpState {
    /// Construct state from the use-case ports and the token verifier.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use storefront::inbound::http::state::{HttpState, HttpStatePorts};
    /// use storefront::domain::ports::TokenService;
    ///
    /// fn build(ports: HttpStatePorts, tokens: Arc<dyn TokenService>) -> HttpState {
    ///     HttpState::new(ports, tokens, Arc::new(DefaultClock))
    /// }
    /// ```
    pub fn new(ports: HttpStatePorts, tokens: Arc<dyn TokenService>, clock: Arc<dyn Clock>) -> Self {
        let HttpStatePorts {
            accounts,
            profiles,
            catalog,
            catalog_admin,
            transactions,
            library,
            recharges,
            recharge_history,
        } = ports;
        Self {
            accounts,
            profiles,
            catalog,
            catalog_admin,
            transactions,
            library,
            recharges,
            recharge_history,
            tokens,
            clock,
        }
    }
}
