//! Backend entry-point: loads settings, migrates the database, and serves the
//! storefront API.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

mod server;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{AppSettings, RawgSettings, ServerConfig, create_server};
use storefront::domain::IdempotencyConfig;
use storefront::inbound::http::health::HealthState;
use storefront::inbound::http::token_config::{BuildMode, token_key_from_env};
use storefront::outbound::persistence::{DbPool, PoolConfig, run_migrations};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let database_url = settings.database_url()?;

    run_migrations(database_url)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let pool = DbPool::new(
        PoolConfig::new(database_url).with_max_size(settings.db_max_connections()),
    )
    .await
    .map_err(|e| std::io::Error::other(e.to_string()))?;

    let env = DefaultEnv::new();
    let token_key = token_key_from_env(&env, BuildMode::from_debug_assertions())
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let rawg = RawgSettings::new(
        settings.rawg_endpoint()?,
        settings.rawg_api_key.clone().unwrap_or_default(),
    );

    let bind_addr = settings.bind_addr();
    let config = ServerConfig::new(bind_addr, pool, token_key, rawg)
        .with_token_ttl(settings.token_ttl())
        .with_idempotency(IdempotencyConfig::from_env(&env))
        .with_sweep_interval(settings.sweep_interval())
        .with_admin_email(settings.admin_email()?);

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config).await?;
    info!(%bind_addr, "storefront listening");
    server.await
}
