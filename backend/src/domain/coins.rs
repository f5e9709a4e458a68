//! Coin amounts used for balances, prices, and top-ups.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Divisor applied to a game's price to obtain its rental fee.
const RENTAL_PRICE_DIVISOR: u64 = 10;

/// A non-negative quantity of store coins.
///
/// Balances, catalog prices, and ledger snapshots all use this type, so a
/// negative amount is unrepresentable in the domain.
///
/// # Examples
/// ```
/// use storefront::domain::Coins;
///
/// let balance = Coins::new(500);
/// let price = Coins::new(300);
/// assert!(balance.covers(price));
/// assert_eq!(balance.checked_sub(price), Some(Coins::new(200)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(u64);

impl Coins {
    /// Zero coins.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw amount.
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Raw amount.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Whether this amount is at least `price`.
    #[must_use]
    pub const fn covers(self, price: Coins) -> bool {
        self.0 >= price.0
    }

    /// Subtract `other`, returning `None` when the result would be negative.
    #[must_use]
    pub fn checked_sub(self, other: Coins) -> Option<Coins> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Add `other`, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Coins) -> Option<Coins> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Rental fee for a game priced at `self`: one tenth, rounded down.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::Coins;
    ///
    /// assert_eq!(Coins::new(1000).rental_fee(), Coins::new(100));
    /// assert_eq!(Coins::new(109).rental_fee(), Coins::new(10));
    /// assert_eq!(Coins::new(9).rental_fee(), Coins::ZERO);
    /// ```
    #[must_use]
    pub const fn rental_fee(self) -> Coins {
        Self(self.0 / RENTAL_PRICE_DIVISOR)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Coins {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl TryFrom<i64> for Coins {
    type Error = std::num::TryFromIntError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value).map(Self)
    }
}

impl TryFrom<Coins> for i64 {
    type Error = std::num::TryFromIntError;

    fn try_from(value: Coins) -> Result<Self, Self::Error> {
        i64::try_from(value.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(500, 300, true)]
    #[case(300, 300, true)]
    #[case(200, 300, false)]
    #[case(0, 0, true)]
    fn covers_compares_inclusively(#[case] balance: u64, #[case] price: u64, #[case] expected: bool) {
        assert_eq!(Coins::new(balance).covers(Coins::new(price)), expected);
    }

    #[rstest]
    fn checked_sub_refuses_to_go_negative() {
        assert_eq!(Coins::new(200).checked_sub(Coins::new(300)), None);
    }

    #[rstest]
    #[case(1000, 100)]
    #[case(999, 99)]
    #[case(0, 0)]
    fn rental_fee_is_floor_of_one_tenth(#[case] price: u64, #[case] fee: u64) {
        assert_eq!(Coins::new(price).rental_fee(), Coins::new(fee));
    }

    #[rstest]
    fn negative_database_amounts_are_rejected() {
        assert!(Coins::try_from(-1_i64).is_err());
        assert_eq!(Coins::try_from(42_i64).ok(), Some(Coins::new(42)));
    }
}
