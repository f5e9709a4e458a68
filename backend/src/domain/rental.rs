//! Rental ledger entries and their lifecycle.
//!
//! A rental is active while `now < expire_at` and expired afterwards. The
//! transition is derived from the clock at read time. The stored status column
//! is a cached hint that a housekeeping sweep may bring up to date; no read
//! path trusts it for liveness.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Coins, Game, GameId, UserId};

/// Length of every rental in days.
pub const RENTAL_WINDOW_DAYS: i64 = 3;

/// Length of every rental.
pub fn rental_window() -> TimeDelta {
    TimeDelta::days(RENTAL_WINDOW_DAYS)
}

/// Rental state, either stored as a hint or derived from the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    Active,
    Expired,
}

impl RentalStatus {
    /// Database representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored rental status is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rental status '{input}': expected active or expired")]
pub struct ParseRentalStatusError {
    pub input: String,
}

impl FromStr for RentalStatus {
    type Err = ParseRentalStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            other => Err(ParseRentalStatusError {
                input: other.to_owned(),
            }),
        }
    }
}

/// A time-boxed entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    pub id: Uuid,
    pub user_id: UserId,
    pub game_id: GameId,
    /// Coins debited for this rental.
    pub fee: Coins,
    pub rent_at: DateTime<Utc>,
    /// Fixed at creation as `rent_at + 3 days`.
    pub expire_at: DateTime<Utc>,
    /// Cached status as last written; may lag the clock.
    pub stored_status: RentalStatus,
}

impl Rental {
    /// Draft a rental of `game` starting at `now`.
    pub fn start(user_id: UserId, game: &Game, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            game_id: game.id,
            fee: game.price.rental_fee(),
            rent_at: now,
            expire_at: now + rental_window(),
            stored_status: RentalStatus::Active,
        }
    }

    /// Whether the rental grants access at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expire_at
    }

    /// Status derived from the clock, ignoring the stored hint.
    pub fn status_at(&self, now: DateTime<Utc>) -> RentalStatus {
        if self.is_active_at(now) {
            RentalStatus::Active
        } else {
            RentalStatus::Expired
        }
    }
}

/// Outcome of checking whether a user currently rents a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalCheck {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<DateTime<Utc>>,
}

impl RentalCheck {
    /// No active rental.
    pub const INACTIVE: Self = Self {
        active: false,
        expire_at: None,
    };

    /// Evaluate the candidate rental against `now`.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeDelta, Utc};
    /// use storefront::domain::{Coins, Game, GameId, Rental, RentalCheck, UserId};
    ///
    /// let game = Game {
    ///     id: GameId::random(),
    ///     rawg_id: None,
    ///     name: "Outer Wilds".into(),
    ///     description: String::new(),
    ///     image_url: String::new(),
    ///     genres: Vec::new(),
    ///     platforms: Vec::new(),
    ///     rating: 4.9,
    ///     price: Coins::new(1000),
    /// };
    /// let now = Utc::now();
    /// let rental = Rental::start(UserId::random(), &game, now);
    ///
    /// assert!(RentalCheck::evaluate(Some(&rental), now).active);
    /// let later = now + TimeDelta::days(3);
    /// assert_eq!(RentalCheck::evaluate(Some(&rental), later), RentalCheck::INACTIVE);
    /// ```
    pub fn evaluate(rental: Option<&Rental>, now: DateTime<Utc>) -> Self {
        match rental {
            Some(rental) if rental.is_active_at(now) => Self {
                active: true,
                expire_at: Some(rental.expire_at),
            },
            _ => Self::INACTIVE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[fixture]
    fn game() -> Game {
        Game {
            id: GameId::random(),
            rawg_id: Some(3498),
            name: "Grand Theft Auto V".into(),
            description: String::new(),
            image_url: String::new(),
            genres: Vec::new(),
            platforms: Vec::new(),
            rating: 4.5,
            price: Coins::new(1000),
        }
    }

    #[rstest]
    fn start_fixes_expiry_three_days_out(game: Game, now: DateTime<Utc>) {
        let rental = Rental::start(UserId::random(), &game, now);
        assert_eq!(rental.expire_at - rental.rent_at, TimeDelta::days(3));
        assert_eq!(rental.fee, Coins::new(100));
        assert_eq!(rental.stored_status, RentalStatus::Active);
    }

    #[rstest]
    #[case(TimeDelta::zero(), RentalStatus::Active)]
    #[case(TimeDelta::days(3) - TimeDelta::seconds(1), RentalStatus::Active)]
    #[case(TimeDelta::days(3), RentalStatus::Expired)]
    #[case(TimeDelta::days(10), RentalStatus::Expired)]
    fn status_is_derived_from_clock(
        game: Game,
        now: DateTime<Utc>,
        #[case] elapsed: TimeDelta,
        #[case] expected: RentalStatus,
    ) {
        let rental = Rental::start(UserId::random(), &game, now);
        assert_eq!(rental.status_at(now + elapsed), expected);
    }

    #[rstest]
    fn check_ignores_stale_stored_status(game: Game, now: DateTime<Utc>) {
        let rental = Rental::start(UserId::random(), &game, now);
        assert_eq!(rental.stored_status, RentalStatus::Active);
        let check = RentalCheck::evaluate(Some(&rental), now + TimeDelta::days(4));
        assert_eq!(check, RentalCheck::INACTIVE);
    }

    #[rstest]
    fn check_reports_expiry_when_active(game: Game, now: DateTime<Utc>) {
        let rental = Rental::start(UserId::random(), &game, now);
        let check = RentalCheck::evaluate(Some(&rental), now);
        assert!(check.active);
        assert_eq!(check.expire_at, Some(now + TimeDelta::days(3)));
    }

    #[rstest]
    fn stored_status_round_trips_through_text() {
        for status in [RentalStatus::Active, RentalStatus::Expired] {
            assert_eq!(status.as_str().parse::<RentalStatus>(), Ok(status));
        }
        assert!("paused".parse::<RentalStatus>().is_err());
    }
}
