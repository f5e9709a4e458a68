//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{AppSettings, RawgSettings, ServerConfig};

use state_builders::{DieselHousekeeping, bootstrap_admin, build_housekeeping, build_http_state};

use std::time::Duration;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::warn;

use storefront::Trace;
#[cfg(debug_assertions)]
use storefront::doc::ApiDoc;
use storefront::inbound::http::configure;
use storefront::inbound::http::health::{HealthState, live, ready};
use storefront::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .configure(configure)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Periodically mark lapsed rentals expired and prune stale idempotency
/// records. Failures are logged and retried on the next tick.
async fn run_housekeeping(service: DieselHousekeeping, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        if let Err(error) = service.sweep().await {
            warn!(error = %error, "housekeeping sweep failed");
        }
    }
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// The bootstrap administrator is promoted before the socket is bound. The
/// housekeeping loop is spawned on the current runtime and lives as long as
/// the process.
///
/// # Errors
/// Propagates [`std::io::Error`] when seeding the administrator, building
/// adapters, binding the socket, or starting the server fails.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    bootstrap_admin(&config).await?;
    let server_health_state = health_state.clone();
    let http_state = build_http_state(&config)?;

    actix_web::rt::spawn(run_housekeeping(
        build_housekeeping(&config),
        config.sweep_interval,
    ));

    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone())
    })
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
