//! Catalog browsing, maintenance, and upstream sync.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::ports::{
    CatalogCommand, CatalogQuery, FeedGame, GameCatalog, GameFeed, GameFeedError, GamePricer,
    SyncReport, SyncRequest,
};
use crate::domain::transaction_service::map_game_catalog_error;
use crate::domain::{Error, Game, GameDraft, GameId, GamePage, PageRequest};

/// Description stored for imported games; the feed's list endpoint has none.
pub const IMPORTED_DESCRIPTION: &str = "No description available";
/// Upper bound on pages fetched by one sync.
pub const MAX_SYNC_PAGES: u32 = 250;
/// Largest page size the upstream feed accepts.
pub const MAX_SYNC_PAGE_SIZE: u32 = 40;

fn map_feed_error(error: GameFeedError) -> Error {
    match error {
        GameFeedError::Transport { message } | GameFeedError::Timeout { message } => {
            Error::service_unavailable(format!("game feed unavailable: {message}"))
        }
        GameFeedError::RateLimited { message } => {
            Error::service_unavailable(format!("game feed rate limited: {message}"))
        }
        GameFeedError::InvalidRequest { message } | GameFeedError::Decode { message } => {
            Error::internal(format!("game feed error: {message}"))
        }
    }
}

fn validate_sync(request: SyncRequest) -> Result<(), Error> {
    if !(1..=MAX_SYNC_PAGES).contains(&request.pages) {
        return Err(Error::invalid_request(format!(
            "pages must be between 1 and {MAX_SYNC_PAGES}"
        )));
    }
    if !(1..=MAX_SYNC_PAGE_SIZE).contains(&request.page_size) {
        return Err(Error::invalid_request(format!(
            "page size must be between 1 and {MAX_SYNC_PAGE_SIZE}"
        )));
    }
    Ok(())
}

/// Catalog service implementing the catalog driving ports.
#[derive(Clone)]
pub struct CatalogService<G, F, P> {
    games: Arc<G>,
    feed: Arc<F>,
    pricer: Arc<P>,
}

impl<G, F, P> CatalogService<G, F, P> {
    pub fn new(games: Arc<G>, feed: Arc<F>, pricer: Arc<P>) -> Self {
        Self {
            games,
            feed,
            pricer,
        }
    }
}

impl<G, F, P> CatalogService<G, F, P>
where
    P: GamePricer,
{
    fn imported_game(&self, entry: FeedGame) -> Game {
        let price = self.pricer.price_for(&entry);
        Game {
            id: GameId::random(),
            rawg_id: Some(entry.rawg_id),
            name: entry.name,
            description: IMPORTED_DESCRIPTION.to_owned(),
            image_url: entry.image_url.unwrap_or_default(),
            genres: entry.genres,
            platforms: entry.platforms,
            rating: entry.rating,
            price,
        }
    }
}

#[async_trait]
impl<G, F, P> CatalogQuery for CatalogService<G, F, P>
where
    G: GameCatalog,
    F: GameFeed,
    P: GamePricer,
{
    async fn list_games(&self, page: PageRequest) -> Result<GamePage, Error> {
        let listing = self
            .games
            .list(page)
            .await
            .map_err(map_game_catalog_error)?;
        Ok(GamePage::new(listing.games, page, listing.total))
    }

    async fn get_game(&self, id: &GameId) -> Result<Game, Error> {
        self.games
            .find_by_id(id)
            .await
            .map_err(map_game_catalog_error)?
            .ok_or_else(|| Error::not_found(format!("game {id} not found")))
    }
}

#[async_trait]
impl<G, F, P> CatalogCommand for CatalogService<G, F, P>
where
    G: GameCatalog,
    F: GameFeed,
    P: GamePricer,
{
    async fn create_game(&self, draft: GameDraft) -> Result<Game, Error> {
        let game = draft
            .into_game()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        self.games
            .create(&game)
            .await
            .map_err(map_game_catalog_error)?;
        info!(game_id = %game.id, name = %game.name, "game created");
        Ok(game)
    }

    async fn delete_game(&self, id: &GameId) -> Result<(), Error> {
        let removed = self
            .games
            .delete(id)
            .await
            .map_err(map_game_catalog_error)?;
        if !removed {
            return Err(Error::not_found(format!("game {id} not found")));
        }
        info!(game_id = %id, "game deleted");
        Ok(())
    }

    async fn sync(&self, request: SyncRequest) -> Result<SyncReport, Error> {
        validate_sync(request)?;
        let mut report = SyncReport::default();

        for page in 1..=request.pages {
            let batch = self
                .feed
                .fetch_page(page, request.page_size)
                .await
                .map_err(map_feed_error)?;
            debug!(page, games = batch.games.len(), "fetched feed page");

            for entry in batch.games {
                report.fetched += 1;
                let game = self.imported_game(entry);
                let inserted = self
                    .games
                    .insert_if_absent(&game)
                    .await
                    .map_err(map_game_catalog_error)?;
                if inserted {
                    report.imported += 1;
                } else {
                    report.skipped += 1;
                }
            }

            if !batch.has_more {
                break;
            }
        }

        info!(
            fetched = report.fetched,
            imported = report.imported,
            skipped = report.skipped,
            "catalog sync finished"
        );
        Ok(report)
    }
}
