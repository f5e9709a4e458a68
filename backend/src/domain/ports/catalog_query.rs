//! Driving port for browsing the catalog.

use async_trait::async_trait;

use crate::domain::{Error, Game, GameId, GamePage, PageRequest};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogQuery: Send + Sync {
    async fn list_games(&self, page: PageRequest) -> Result<GamePage, Error>;

    async fn get_game(&self, id: &GameId) -> Result<Game, Error>;
}
