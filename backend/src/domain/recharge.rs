//! Coin top-ups.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Coins, UserId};

/// Smallest amount a single recharge may add.
pub const MIN_RECHARGE: Coins = Coins::new(100);

/// Validation errors for recharge requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RechargeValidationError {
    #[error("recharge amount must be at least {min}, got {actual}")]
    BelowMinimum { min: Coins, actual: Coins },
    #[error("unknown recharge status '{0}'")]
    UnknownStatus(String),
}

/// Processing state of a recharge.
///
/// Without a payment gateway every accepted recharge is recorded as
/// [`RechargeStatus::Success`]; the other states exist for rows written by
/// older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RechargeStatus {
    Pending,
    Success,
    Failed,
}

impl RechargeStatus {
    /// Database representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RechargeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RechargeStatus {
    type Err = RechargeValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(RechargeValidationError::UnknownStatus(other.to_owned())),
        }
    }
}

/// A validated recharge amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RechargeAmount(Coins);

impl RechargeAmount {
    /// Validate that `amount` meets [`MIN_RECHARGE`].
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::{Coins, RechargeAmount};
    ///
    /// assert!(RechargeAmount::new(Coins::new(100)).is_ok());
    /// assert!(RechargeAmount::new(Coins::new(99)).is_err());
    /// ```
    pub fn new(amount: Coins) -> Result<Self, RechargeValidationError> {
        if !amount.covers(MIN_RECHARGE) {
            return Err(RechargeValidationError::BelowMinimum {
                min: MIN_RECHARGE,
                actual: amount,
            });
        }
        Ok(Self(amount))
    }

    /// Amount in coins.
    pub fn coins(self) -> Coins {
        self.0
    }
}

/// A recorded top-up of a user's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recharge {
    pub id: Uuid,
    pub user_id: UserId,
    pub amount: Coins,
    pub status: RechargeStatus,
    pub created_at: DateTime<Utc>,
}

impl Recharge {
    /// Draft a successful recharge.
    pub fn succeeded(user_id: UserId, amount: RechargeAmount, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            amount: amount.coins(),
            status: RechargeStatus::Success,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, false)]
    #[case(99, false)]
    #[case(100, true)]
    #[case(5_000, true)]
    fn amount_enforces_minimum(#[case] raw: u64, #[case] accepted: bool) {
        assert_eq!(RechargeAmount::new(Coins::new(raw)).is_ok(), accepted);
    }

    #[rstest]
    fn succeeded_recharge_carries_amount() {
        let amount = RechargeAmount::new(Coins::new(250)).expect("valid amount");
        let recharge = Recharge::succeeded(UserId::random(), amount, Utc::now());
        assert_eq!(recharge.amount, Coins::new(250));
        assert_eq!(recharge.status, RechargeStatus::Success);
    }

    #[rstest]
    #[case("pending", RechargeStatus::Pending)]
    #[case("success", RechargeStatus::Success)]
    #[case("failed", RechargeStatus::Failed)]
    fn status_parses_stored_text(#[case] raw: &str, #[case] expected: RechargeStatus) {
        assert_eq!(raw.parse::<RechargeStatus>(), Ok(expected));
    }
}
