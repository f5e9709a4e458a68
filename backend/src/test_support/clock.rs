//! A clock tests can move forward.
//!
//! Rental expiry is derived from the clock at read time, so tests step this
//! clock past `expire_at` instead of sleeping.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

/// Clock frozen at a chosen instant until a test moves it.
///
/// # Examples
/// ```
/// use chrono::{TimeDelta, Utc};
/// use mockable::Clock;
/// use storefront::test_support::MutableClock;
///
/// let start = Utc::now();
/// let clock = MutableClock::new(start);
/// clock.advance_seconds(3 * 24 * 3600);
/// assert_eq!(clock.utc(), start + TimeDelta::days(3));
/// ```
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move forward by `seconds`; negative values move back.
    pub fn advance_seconds(&self, seconds: i64) {
        *self.now() += TimeDelta::seconds(seconds);
    }

    /// Jump to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now() = instant;
    }

    // A panicking test may poison the lock; the instant itself stays valid.
    fn now(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn set_then_advance() {
        let clock = MutableClock::new(Utc::now());
        let anchor = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("valid");
        clock.set(anchor);
        clock.advance_seconds(-60);
        assert_eq!(clock.utc(), anchor - TimeDelta::minutes(1));
    }
}
