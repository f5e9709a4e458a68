//! Purchase ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Coins, Game, GameId, UserId};

/// A permanent entitlement bought at a fixed price.
///
/// `price` is a snapshot of the catalog price at the purchase instant and is
/// never rewritten, even if the catalog price later changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,
    pub user_id: UserId,
    pub game_id: GameId,
    pub price: Coins,
    pub purchased_at: DateTime<Utc>,
}

impl Purchase {
    /// Draft a purchase of `game` by `user_id` at `now`.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use storefront::domain::{Coins, Game, GameId, Purchase, UserId};
    ///
    /// let game = Game {
    ///     id: GameId::random(),
    ///     rawg_id: None,
    ///     name: "Celeste".into(),
    ///     description: String::new(),
    ///     image_url: String::new(),
    ///     genres: Vec::new(),
    ///     platforms: Vec::new(),
    ///     rating: 4.8,
    ///     price: Coins::new(300),
    /// };
    /// let purchase = Purchase::new(UserId::random(), &game, Utc::now());
    /// assert_eq!(purchase.price, Coins::new(300));
    /// ```
    pub fn new(user_id: UserId, game: &Game, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            game_id: game.id,
            price: game.price,
            purchased_at: now,
        }
    }
}
