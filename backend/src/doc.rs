//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint, the error schema wrappers from
//! [`crate::inbound::http::schemas`], and the bearer-token security scheme.
//! The document backs Swagger UI in debug builds and is exported by
//! `cargo run --bin openapi-dump`.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};

/// Enrich the generated document with the bearer-token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        let mut scheme = Http::new(HttpAuthScheme::Bearer);
        scheme.description = Some("Signed token issued by POST /auth/login.".to_owned());
        components.add_security_scheme("BearerToken", SecurityScheme::Http(scheme));
    }
}

/// OpenAPI document for the storefront API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Storefront backend API",
        description = "Game catalog, coin balances, purchases and three-day rentals."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::profile,
        crate::inbound::http::accounts::promote_user,
        crate::inbound::http::games::list_games,
        crate::inbound::http::games::get_game,
        crate::inbound::http::games::create_game,
        crate::inbound::http::games::delete_game,
        crate::inbound::http::games::sync_catalog,
        crate::inbound::http::transactions::buy_game,
        crate::inbound::http::transactions::rent_game,
        crate::inbound::http::transactions::check_rental,
        crate::inbound::http::transactions::my_purchases,
        crate::inbound::http::transactions::my_rentals,
        crate::inbound::http::transactions::my_games,
        crate::inbound::http::recharges::recharge,
        crate::inbound::http::recharges::recharge_history,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorSchema, ErrorCodeSchema)),
    tags(
        (name = "accounts", description = "Registration, login and profile"),
        (name = "games", description = "Catalog browsing and administration"),
        (name = "transactions", description = "Buying and renting games"),
        (name = "library", description = "The caller's purchases, rentals and games"),
        (name = "recharges", description = "Coin top-ups"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
