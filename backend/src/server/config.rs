//! Application settings and the HTTP server configuration object.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;

use storefront::domain::{EmailAddress, IdempotencyConfig};
use storefront::outbound::persistence::DbPool;
use storefront::outbound::rawg::RAWG_DEFAULT_ENDPOINT;
use storefront::outbound::security::TokenSigningKey;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TOKEN_TTL_HOURS: u32 = 24;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const RAWG_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings read from `STOREFRONT_*` environment variables, CLI flags, or a
/// configuration file.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STOREFRONT")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Lifetime of issued bearer tokens.
    pub token_ttl_hours: Option<u32>,
    /// RAWG API key used by catalog sync.
    pub rawg_api_key: Option<String>,
    /// RAWG games listing endpoint.
    pub rawg_base_url: Option<String>,
    /// Seconds between housekeeping sweeps.
    pub sweep_interval_secs: Option<u64>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Account that becomes the first administrator.
    pub admin_email: Option<String>,
}

impl AppSettings {
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)))
    }

    /// Return the database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when `STOREFRONT_DATABASE_URL` is not set.
    pub fn database_url(&self) -> std::io::Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            std::io::Error::other("STOREFRONT_DATABASE_URL must be set to a PostgreSQL URL")
        })
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(
            self.token_ttl_hours.unwrap_or(DEFAULT_TOKEN_TTL_HOURS).max(1),
        ))
    }

    /// Parse the configured RAWG endpoint, falling back to the public one.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured URL does not parse.
    pub fn rawg_endpoint(&self) -> std::io::Result<Url> {
        let raw = self.rawg_base_url.as_deref().unwrap_or(RAWG_DEFAULT_ENDPOINT);
        Url::parse(raw)
            .map_err(|err| std::io::Error::other(format!("invalid RAWG base URL {raw}: {err}")))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(
            self.sweep_interval_secs
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS)
                .max(1),
        )
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .max(1)
    }

    /// Parse the bootstrap administrator's email, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured value is not an email address.
    pub fn admin_email(&self) -> std::io::Result<Option<EmailAddress>> {
        self.admin_email
            .as_deref()
            .map(|raw| {
                EmailAddress::new(raw).map_err(|err| {
                    std::io::Error::other(format!("invalid STOREFRONT_ADMIN_EMAIL: {err}"))
                })
            })
            .transpose()
    }
}

/// Upstream catalog feed settings.
#[derive(Debug, Clone)]
pub struct RawgSettings {
    pub(crate) endpoint: Url,
    pub(crate) api_key: String,
    pub(crate) timeout: Duration,
}

impl RawgSettings {
    pub fn new(endpoint: Url, api_key: impl Into<String>) -> Self {
        Self {
            endpoint,
            api_key: api_key.into(),
            timeout: RAWG_TIMEOUT,
        }
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) token_key: TokenSigningKey,
    pub(crate) token_ttl: chrono::Duration,
    pub(crate) rawg: RawgSettings,
    pub(crate) idempotency: IdempotencyConfig,
    pub(crate) sweep_interval: Duration,
    pub(crate) admin_email: Option<EmailAddress>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        db_pool: DbPool,
        token_key: TokenSigningKey,
        rawg: RawgSettings,
    ) -> Self {
        Self {
            bind_addr,
            db_pool,
            token_key,
            token_ttl: chrono::Duration::hours(i64::from(DEFAULT_TOKEN_TTL_HOURS)),
            rawg,
            idempotency: IdempotencyConfig::default(),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            admin_email: None,
        }
    }

    #[must_use]
    pub fn with_token_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Retention window for stored idempotent responses.
    #[must_use]
    pub fn with_idempotency(mut self, config: IdempotencyConfig) -> Self {
        self.idempotency = config;
        self
    }

    /// Interval between rental-expiry and idempotency sweeps.
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Email whose account is granted the admin role.
    #[must_use]
    pub fn with_admin_email(mut self, email: Option<EmailAddress>) -> Self {
        self.admin_email = email;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 8] = [
        "STOREFRONT_BIND_ADDR",
        "STOREFRONT_DATABASE_URL",
        "STOREFRONT_TOKEN_TTL_HOURS",
        "STOREFRONT_RAWG_API_KEY",
        "STOREFRONT_RAWG_BASE_URL",
        "STOREFRONT_SWEEP_INTERVAL_SECS",
        "STOREFRONT_DB_MAX_CONNECTIONS",
        "STOREFRONT_ADMIN_EMAIL",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("storefront")]).expect("settings should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr(), "0.0.0.0:8080".parse().expect("addr"));
        assert!(settings.database_url().is_err());
        assert_eq!(settings.token_ttl(), chrono::Duration::hours(24));
        assert_eq!(
            settings.rawg_endpoint().expect("default endpoint").as_str(),
            RAWG_DEFAULT_ENDPOINT
        );
        assert_eq!(settings.sweep_interval(), Duration::from_secs(300));
        assert_eq!(settings.db_max_connections(), 10);
        assert_eq!(settings.admin_email().expect("no admin email"), None);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("STOREFRONT_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            (
                "STOREFRONT_DATABASE_URL",
                Some("postgres://store@localhost/store".to_owned()),
            ),
            ("STOREFRONT_TOKEN_TTL_HOURS", Some("2".to_owned())),
            ("STOREFRONT_RAWG_API_KEY", None),
            (
                "STOREFRONT_RAWG_BASE_URL",
                Some("http://rawg.test/api/games".to_owned()),
            ),
            ("STOREFRONT_SWEEP_INTERVAL_SECS", Some("30".to_owned())),
            ("STOREFRONT_DB_MAX_CONNECTIONS", Some("4".to_owned())),
            ("STOREFRONT_ADMIN_EMAIL", Some(" Root@Example.com ".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr(), "127.0.0.1:9000".parse().expect("addr"));
        assert_eq!(
            settings.database_url().expect("url"),
            "postgres://store@localhost/store"
        );
        assert_eq!(settings.token_ttl(), chrono::Duration::hours(2));
        assert_eq!(
            settings.rawg_endpoint().expect("endpoint").host_str(),
            Some("rawg.test")
        );
        assert_eq!(settings.sweep_interval(), Duration::from_secs(30));
        assert_eq!(settings.db_max_connections(), 4);
        assert_eq!(
            settings.admin_email().expect("admin email"),
            Some(EmailAddress::new("root@example.com").expect("email"))
        );
    }

    #[rstest]
    fn malformed_rawg_url_is_reported() {
        let _guard = lock_env(VARS.map(|name| {
            let value = (name == "STOREFRONT_RAWG_BASE_URL").then(|| "not a url".to_owned());
            (name, value)
        }));

        let settings = load_from_empty_args();
        assert!(settings.rawg_endpoint().is_err());
    }

    #[rstest]
    fn malformed_admin_email_is_reported() {
        let _guard = lock_env(VARS.map(|name| {
            let value = (name == "STOREFRONT_ADMIN_EMAIL").then(|| "root-at-example".to_owned());
            (name, value)
        }));

        let settings = load_from_empty_args();
        assert!(settings.admin_email().is_err());
    }
}
