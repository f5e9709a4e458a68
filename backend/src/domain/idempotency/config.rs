//! Retention window for idempotency records.

use std::time::Duration;

use mockable::Env;

/// Environment variable holding the retention window in hours.
pub const IDEMPOTENCY_TTL_HOURS_ENV: &str = "IDEMPOTENCY_TTL_HOURS";

const DEFAULT_TTL_HOURS: u64 = 24;
const MIN_TTL_HOURS: u64 = 1;
const MAX_TTL_HOURS: u64 = 24 * 365 * 10;

/// How long a stored response stays replayable.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use storefront::domain::idempotency::IdempotencyConfig;
///
/// assert_eq!(IdempotencyConfig::default().ttl(), Duration::from_secs(24 * 3600));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotencyConfig {
    ttl: Duration,
}

impl IdempotencyConfig {
    /// Read `IDEMPOTENCY_TTL_HOURS`, clamped to one hour through ten years.
    ///
    /// Missing or unparsable values fall back to 24 hours.
    pub fn from_env(env: &impl Env) -> Self {
        let hours = env
            .string(IDEMPOTENCY_TTL_HOURS_ENV)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TTL_HOURS)
            .clamp(MIN_TTL_HOURS, MAX_TTL_HOURS);
        Self::with_ttl(Duration::from_secs(hours * 3600))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_TTL_HOURS * 3600))
    }
}
