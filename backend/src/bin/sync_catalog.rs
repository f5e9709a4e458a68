//! Import games from RAWG into the catalog, skipping RAWG ids already stored.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use reqwest::Url;
use storefront::domain::ports::{CatalogCommand, SyncRequest};
use storefront::domain::{CatalogService, RandomGamePricer};
use storefront::outbound::persistence::{DbPool, DieselGameCatalog, PoolConfig};
use storefront::outbound::rawg::{RAWG_DEFAULT_ENDPOINT, RawgHttpSource};
use tokio::runtime::Builder;

/// `sync-catalog` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sync-catalog",
    about = "Import games from the RAWG listing into the storefront catalog",
    version
)]
struct CliArgs {
    /// Number of listing pages to fetch.
    #[arg(long, default_value_t = 1)]
    pages: u32,
    /// Games per page (RAWG caps this at 40).
    #[arg(long = "page-size", default_value_t = 40)]
    page_size: u32,
    /// RAWG API key. Falls back to `STOREFRONT_RAWG_API_KEY` when omitted.
    #[arg(long = "api-key", value_name = "key")]
    api_key: Option<String>,
    /// RAWG games endpoint.
    #[arg(long = "endpoint", value_name = "url", default_value = RAWG_DEFAULT_ENDPOINT)]
    endpoint: Url,
    /// Database connection URL. Falls back to `STOREFRONT_DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> io::Result<()> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let database_url = resolve_arg(args.database_url, "--database-url", "STOREFRONT_DATABASE_URL")?;
    let api_key = resolve_arg(args.api_key, "--api-key", "STOREFRONT_RAWG_API_KEY")?;

    let pool = DbPool::new(PoolConfig::new(&database_url).with_max_size(2))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;
    let feed = RawgHttpSource::new(args.endpoint, api_key, Duration::from_secs(10))
        .map_err(|error| io::Error::other(format!("create RAWG client: {error}")))?;
    let catalog = CatalogService::new(
        Arc::new(DieselGameCatalog::new(pool)),
        Arc::new(feed),
        Arc::new(RandomGamePricer),
    );

    let report = catalog
        .sync(SyncRequest {
            pages: args.pages,
            page_size: args.page_size,
        })
        .await
        .map_err(|error| io::Error::other(format!("catalog sync failed: {error}")))?;

    println!("fetched={}", report.fetched);
    println!("imported={}", report.imported);
    println!("skipped={}", report.skipped);
    Ok(())
}

/// Prefer the explicit flag, then the environment variable.
fn resolve_arg(explicit: Option<String>, flag: &str, env_var: &str) -> io::Result<String> {
    let value = match explicit {
        Some(value) => value,
        None => env::var(env_var).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("missing value: set {flag} or {env_var}"),
            )
        })?,
    };
    if value.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{flag} must not be empty"),
        ));
    }
    Ok(value)
}
