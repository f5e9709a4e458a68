//! Merge purchases and rentals into a per-game ownership view.
//!
//! The merge is pure: callers fetch the ledger rows and the referenced games,
//! then hand them to [`resolve_entitlements`]. Expired rentals still mark a
//! game as rented; callers that care about liveness consult
//! [`Rental::is_active_at`](super::Rental::is_active_at).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Coins, Game, GameId, Purchase, Rental, RentalStatus};

/// One distinct game the user has bought or rented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedGame {
    pub game_id: GameId,
    pub name: String,
    pub image_url: String,
    pub price: Coins,
    pub is_purchased: bool,
    pub is_rented: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<DateTime<Utc>>,
}

impl OwnedGame {
    fn from_game(game: &Game) -> Self {
        Self {
            game_id: game.id,
            name: game.name.clone(),
            image_url: game.image_url.clone(),
            price: game.price,
            is_purchased: false,
            is_rented: false,
            expire_at: None,
        }
    }
}

/// Catalog fields shown next to a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub id: GameId,
    pub name: String,
    pub image_url: String,
    pub price: Coins,
}

impl From<&Game> for GameSummary {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id,
            name: game.name.clone(),
            image_url: game.image_url.clone(),
            price: game.price,
        }
    }
}

/// A purchase joined with its catalog entry.
///
/// `game` is `None` once the game has been removed from the catalog; the
/// purchase itself is never dropped from the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasedGame {
    pub purchase_id: Uuid,
    /// Price paid at purchase time.
    pub price: Coins,
    pub purchased_at: DateTime<Utc>,
    pub game: Option<GameSummary>,
}

/// A rental joined with its catalog entry and clock-derived status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentedGame {
    pub rental_id: Uuid,
    pub fee: Coins,
    pub rent_at: DateTime<Utc>,
    pub expire_at: DateTime<Utc>,
    pub status: RentalStatus,
    pub game: Option<GameSummary>,
}

fn catalog_index(games: &[Game]) -> HashMap<GameId, &Game> {
    games.iter().map(|g| (g.id, g)).collect()
}

/// Purchases in ledger order, each joined with catalog data.
pub fn purchase_history(purchases: &[Purchase], games: &[Game]) -> Vec<PurchasedGame> {
    let catalog = catalog_index(games);
    purchases
        .iter()
        .map(|purchase| PurchasedGame {
            purchase_id: purchase.id,
            price: purchase.price,
            purchased_at: purchase.purchased_at,
            game: catalog.get(&purchase.game_id).map(|g| GameSummary::from(*g)),
        })
        .collect()
}

/// Rentals in ledger order with the status they have at `now`.
pub fn rental_history(rentals: &[Rental], games: &[Game], now: DateTime<Utc>) -> Vec<RentedGame> {
    let catalog = catalog_index(games);
    rentals
        .iter()
        .map(|rental| RentedGame {
            rental_id: rental.id,
            fee: rental.fee,
            rent_at: rental.rent_at,
            expire_at: rental.expire_at,
            status: rental.status_at(now),
            game: catalog.get(&rental.game_id).map(|g| GameSummary::from(*g)),
        })
        .collect()
}

/// Distinct game ids referenced by the ledger rows, in first-seen order.
pub fn referenced_game_ids(purchases: &[Purchase], rentals: &[Rental]) -> Vec<GameId> {
    let mut seen = HashSet::new();
    purchases
        .iter()
        .map(|p| p.game_id)
        .chain(rentals.iter().map(|r| r.game_id))
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Build one entry per distinct game.
///
/// Purchased games come first in ledger order, then rental-only games in
/// ledger order. When a game has several rentals the last one supplies
/// `expire_at`. Ledger rows whose game is missing from `games` are skipped.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use storefront::domain::{
///     resolve_entitlements, Coins, Game, GameId, Purchase, Rental, UserId,
/// };
///
/// let game = Game {
///     id: GameId::random(),
///     rawg_id: None,
///     name: "Hollow Knight".into(),
///     description: String::new(),
///     image_url: String::new(),
///     genres: Vec::new(),
///     platforms: Vec::new(),
///     rating: 4.7,
///     price: Coins::new(300),
/// };
/// let user = UserId::random();
/// let now = Utc::now();
/// let purchases = vec![Purchase::new(user.clone(), &game, now)];
/// let rentals = vec![Rental::start(user, &game, now)];
///
/// let owned = resolve_entitlements(&purchases, &rentals, &[game]);
/// assert_eq!(owned.len(), 1);
/// assert!(owned[0].is_purchased && owned[0].is_rented);
/// ```
pub fn resolve_entitlements(
    purchases: &[Purchase],
    rentals: &[Rental],
    games: &[Game],
) -> Vec<OwnedGame> {
    let catalog = catalog_index(games);
    let mut owned: Vec<OwnedGame> = Vec::new();
    let mut positions: HashMap<GameId, usize> = HashMap::new();

    let mut entry_for = |game_id: GameId, owned: &mut Vec<OwnedGame>| -> Option<usize> {
        let game = catalog.get(&game_id)?;
        let index = *positions.entry(game_id).or_insert_with(|| {
            owned.push(OwnedGame::from_game(game));
            owned.len() - 1
        });
        Some(index)
    };

    for purchase in purchases {
        if let Some(index) = entry_for(purchase.game_id, &mut owned) {
            owned[index].is_purchased = true;
        }
    }

    for rental in rentals {
        if let Some(index) = entry_for(rental.game_id, &mut owned) {
            let entry = &mut owned[index];
            entry.is_rented = true;
            entry.expire_at = Some(rental.expire_at);
        }
    }

    owned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use chrono::{TimeDelta, TimeZone};
    use rstest::{fixture, rstest};

    fn game(name: &str, price: u64) -> Game {
        Game {
            id: GameId::random(),
            rawg_id: None,
            name: name.into(),
            description: String::new(),
            image_url: format!("https://img.example/{name}.png"),
            genres: Vec::new(),
            platforms: Vec::new(),
            rating: 4.0,
            price: Coins::new(price),
        }
    }

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    fn purchase_and_rental_of_same_game_collapse(now: DateTime<Utc>) {
        let user = UserId::random();
        let doom = game("doom", 400);
        let purchases = vec![Purchase::new(user.clone(), &doom, now)];
        let rentals = vec![Rental::start(user, &doom, now)];

        let owned = resolve_entitlements(&purchases, &rentals, std::slice::from_ref(&doom));

        assert_eq!(owned.len(), 1);
        let entry = &owned[0];
        assert!(entry.is_purchased);
        assert!(entry.is_rented);
        assert_eq!(entry.expire_at, Some(now + TimeDelta::days(3)));
    }

    #[rstest]
    fn purchases_precede_rental_only_games(now: DateTime<Utc>) {
        let user = UserId::random();
        let rented = game("rented", 100);
        let bought = game("bought", 200);
        let purchases = vec![Purchase::new(user.clone(), &bought, now)];
        let rentals = vec![Rental::start(user, &rented, now)];

        let owned = resolve_entitlements(&purchases, &rentals, &[rented.clone(), bought.clone()]);

        let ids: Vec<_> = owned.iter().map(|o| o.game_id).collect();
        assert_eq!(ids, vec![bought.id, rented.id]);
        assert!(!owned[0].is_rented);
        assert_eq!(owned[0].expire_at, None);
        assert!(!owned[1].is_purchased);
    }

    #[rstest]
    fn expired_rentals_still_mark_game_rented(now: DateTime<Utc>) {
        let user = UserId::random();
        let old = game("old", 500);
        let rentals = vec![Rental::start(user, &old, now - TimeDelta::days(30))];

        let owned = resolve_entitlements(&[], &rentals, std::slice::from_ref(&old));

        assert_eq!(owned.len(), 1);
        assert!(owned[0].is_rented);
        assert_eq!(owned[0].expire_at, Some(now - TimeDelta::days(27)));
    }

    #[rstest]
    fn last_rental_supplies_expiry(now: DateTime<Utc>) {
        let user = UserId::random();
        let repeat = game("repeat", 300);
        let rentals = vec![
            Rental::start(user.clone(), &repeat, now - TimeDelta::days(10)),
            Rental::start(user, &repeat, now),
        ];

        let owned = resolve_entitlements(&[], &rentals, std::slice::from_ref(&repeat));

        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].expire_at, Some(now + TimeDelta::days(3)));
    }

    #[rstest]
    fn games_missing_from_catalog_are_skipped(now: DateTime<Utc>) {
        let user = UserId::random();
        let deleted = game("deleted", 300);
        let kept = game("kept", 300);
        let purchases = vec![
            Purchase::new(user.clone(), &deleted, now),
            Purchase::new(user.clone(), &kept, now),
            Purchase::new(user, &kept, now),
        ];

        let owned = resolve_entitlements(&purchases, &[], std::slice::from_ref(&kept));

        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].game_id, kept.id);
    }

    #[rstest]
    fn rental_history_derives_status_from_clock(now: DateTime<Utc>) {
        let user = UserId::random();
        let quake = game("quake", 250);
        let rentals = vec![
            Rental::start(user.clone(), &quake, now - TimeDelta::days(5)),
            Rental::start(user, &quake, now),
        ];

        let history = rental_history(&rentals, std::slice::from_ref(&quake), now);

        let statuses: Vec<_> = history.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![RentalStatus::Expired, RentalStatus::Active]);
        assert_eq!(history[0].rental_id, rentals[0].id);
        assert_eq!(history[1].fee, Coins::new(25));
    }

    #[rstest]
    fn purchase_history_keeps_rows_for_deleted_games(now: DateTime<Utc>) {
        let user = UserId::random();
        let gone = game("gone", 800);
        let purchases = vec![Purchase::new(user, &gone, now)];

        let history = purchase_history(&purchases, &[]);

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].price, Coins::new(800));
        assert!(history[0].game.is_none());
    }

    #[rstest]
    fn referenced_ids_are_distinct_and_ordered(now: DateTime<Utc>) {
        let user = UserId::random();
        let a = game("a", 100);
        let b = game("b", 100);
        let purchases = vec![Purchase::new(user.clone(), &a, now)];
        let rentals = vec![
            Rental::start(user.clone(), &b, now),
            Rental::start(user, &a, now),
        ];

        assert_eq!(referenced_game_ids(&purchases, &rentals), vec![a.id, b.id]);
    }
}
