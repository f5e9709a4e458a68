//! Driven port for catalog storage.

use async_trait::async_trait;

use crate::domain::{Game, GameId, PageRequest};

use super::define_port_error;

define_port_error! {
    /// Errors raised by game catalog adapters.
    pub enum GameCatalogError {
        Connection { message: String } => "game catalog connection failed: {message}",
        Query { message: String } => "game catalog query failed: {message}",
    }
}

/// One page of games plus the size of the whole catalog.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameListing {
    pub games: Vec<Game>,
    pub total: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameCatalog: Send + Sync {
    async fn find_by_id(&self, id: &GameId) -> Result<Option<Game>, GameCatalogError>;

    /// Batch lookup. Unknown ids are silently absent from the result.
    async fn find_many(&self, ids: &[GameId]) -> Result<Vec<Game>, GameCatalogError>;

    /// Page through the catalog ordered by name.
    async fn list(&self, page: PageRequest) -> Result<GameListing, GameCatalogError>;

    async fn create(&self, game: &Game) -> Result<(), GameCatalogError>;

    /// Remove a game; returns `false` when it did not exist.
    async fn delete(&self, id: &GameId) -> Result<bool, GameCatalogError>;

    /// Insert an imported game unless one with the same RAWG id exists.
    ///
    /// Returns `true` when a row was inserted.
    async fn insert_if_absent(&self, game: &Game) -> Result<bool, GameCatalogError>;
}
