//! Driven port for the upstream game feed used by catalog sync.

use async_trait::async_trait;

use crate::domain::Coins;

use super::define_port_error;

/// One game as described by the upstream feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedGame {
    pub rawg_id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub rating: f64,
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
}

/// One page of upstream results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedPage {
    pub games: Vec<FeedGame>,
    /// Whether the feed advertises another page.
    pub has_more: bool,
}

define_port_error! {
    /// Errors raised by game feed adapters.
    pub enum GameFeedError {
        Transport { message: String } => "game feed transport failed: {message}",
        Timeout { message: String } => "game feed timed out: {message}",
        RateLimited { message: String } => "game feed rate limited the request: {message}",
        InvalidRequest { message: String } => "game feed rejected the request: {message}",
        Decode { message: String } => "game feed response could not be decoded: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameFeed: Send + Sync {
    /// Fetch one-based `page` with up to `page_size` games.
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<FeedPage, GameFeedError>;
}

/// Price policy for imported games.
#[cfg_attr(test, mockall::automock)]
pub trait GamePricer: Send + Sync {
    fn price_for(&self, game: &FeedGame) -> Coins;
}
