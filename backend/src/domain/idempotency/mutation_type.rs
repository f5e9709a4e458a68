//! Which coin-moving operation an idempotency record protects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operation guarded by an idempotency key.
///
/// Keys are scoped per mutation so one UUID reused across `buy` and `rent`
/// never replays the wrong response.
///
/// # Examples
/// ```
/// use storefront::domain::idempotency::MutationType;
///
/// assert_eq!(MutationType::Rental.as_str(), "rental");
/// assert_eq!("purchase".parse::<MutationType>(), Ok(MutationType::Purchase));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationType {
    /// `POST /buy/{game_id}`.
    Purchase,
    /// `POST /rent/{game_id}`.
    Rental,
    /// `POST /recharge`.
    Recharge,
}

impl MutationType {
    /// Every variant, in storage order.
    pub const ALL: [MutationType; 3] = [Self::Purchase, Self::Rental, Self::Recharge];

    /// Database representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Rental => "rental",
            Self::Recharge => "recharge",
        }
    }
}

impl fmt::Display for MutationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored mutation type is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid mutation type '{input}': expected purchase, rental or recharge")]
pub struct ParseMutationTypeError {
    pub input: String,
}

impl FromStr for MutationType {
    type Err = ParseMutationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|variant| variant.as_str() == s)
            .ok_or_else(|| ParseMutationTypeError {
                input: s.to_owned(),
            })
    }
}
