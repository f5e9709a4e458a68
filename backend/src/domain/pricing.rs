//! Price policy for games imported from the upstream feed.

use rand::Rng;

use crate::domain::Coins;
use crate::domain::ports::{FeedGame, GamePricer};

/// Cheapest price assigned to an imported game.
pub const IMPORT_PRICE_MIN: u64 = 100;
/// Most expensive price assigned to an imported game.
pub const IMPORT_PRICE_MAX: u64 = 999;

/// Assigns each imported game a uniformly random price.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGamePricer;

impl GamePricer for RandomGamePricer {
    fn price_for(&self, _game: &FeedGame) -> Coins {
        Coins::new(rand::thread_rng().gen_range(IMPORT_PRICE_MIN..=IMPORT_PRICE_MAX))
    }
}

/// Always returns the same price. Handy for deterministic imports.
#[derive(Debug, Clone, Copy)]
pub struct FixedGamePricer(pub Coins);

impl GamePricer for FixedGamePricer {
    fn price_for(&self, _game: &FeedGame) -> Coins {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn feed_game() -> FeedGame {
        FeedGame {
            rawg_id: 3498,
            name: "Grand Theft Auto V".into(),
            image_url: None,
            rating: 4.47,
            genres: vec![],
            platforms: vec![],
        }
    }

    #[rstest]
    fn random_prices_stay_in_range() {
        let pricer = RandomGamePricer;
        for _ in 0..200 {
            let price = pricer.price_for(&feed_game()).value();
            assert!((IMPORT_PRICE_MIN..=IMPORT_PRICE_MAX).contains(&price), "{price}");
        }
    }

    #[rstest]
    fn fixed_pricer_returns_its_price() {
        let pricer = FixedGamePricer(Coins::new(500));
        assert_eq!(pricer.price_for(&feed_game()), Coins::new(500));
    }
}
