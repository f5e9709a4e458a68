//! PostgreSQL-backed `GameCatalog`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{GameCatalog, GameCatalogError, GameListing};
use crate::domain::{Game, GameId, PageRequest};

use super::diesel_error_mapping::{classify_diesel_error, map_basic_failure};
use super::models::{GameRow, NewGameRow, coins_to_db};
use super::pool::{DbPool, PoolError};
use super::schema::games;

#[derive(Clone)]
pub struct DieselGameCatalog {
    pool: DbPool,
}

impl DieselGameCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> GameCatalogError {
    GameCatalogError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> GameCatalogError {
    map_basic_failure(
        classify_diesel_error(error),
        GameCatalogError::query,
        GameCatalogError::connection,
    )
}

fn to_domain(rows: Vec<GameRow>) -> Result<Vec<Game>, GameCatalogError> {
    rows.into_iter()
        .map(|row| Game::try_from(row).map_err(|err| GameCatalogError::query(err.to_string())))
        .collect()
}

fn new_row(game: &Game) -> Result<NewGameRow<'_>, GameCatalogError> {
    Ok(NewGameRow {
        id: *game.id.as_uuid(),
        rawg_id: game.rawg_id,
        name: &game.name,
        description: &game.description,
        image_url: &game.image_url,
        genres: &game.genres,
        platforms: &game.platforms,
        rating: game.rating,
        price: coins_to_db(game.price).map_err(GameCatalogError::query)?,
    })
}

#[async_trait]
impl GameCatalog for DieselGameCatalog {
    async fn find_by_id(&self, id: &GameId) -> Result<Option<Game>, GameCatalogError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = games::table
            .filter(games::id.eq(id.as_uuid()))
            .select(GameRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| Game::try_from(row).map_err(|err| GameCatalogError::query(err.to_string())))
            .transpose()
    }

    async fn find_many(&self, ids: &[GameId]) -> Result<Vec<Game>, GameCatalogError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = games::table
            .filter(games::id.eq_any(&uuids))
            .select(GameRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        to_domain(rows)
    }

    async fn list(&self, page: PageRequest) -> Result<GameListing, GameCatalogError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = games::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let offset = i64::try_from(page.offset())
            .map_err(|err| GameCatalogError::query(format!("page offset out of range: {err}")))?;
        let rows = games::table
            .order((games::name.asc(), games::id.asc()))
            .limit(i64::from(page.limit()))
            .offset(offset)
            .select(GameRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(GameListing {
            games: to_domain(rows)?,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn create(&self, game: &Game) -> Result<(), GameCatalogError> {
        let row = new_row(game)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(games::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn delete(&self, id: &GameId) -> Result<bool, GameCatalogError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(games::table.filter(games::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn insert_if_absent(&self, game: &Game) -> Result<bool, GameCatalogError> {
        let row = new_row(game)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // The partial unique index on rawg_id turns a known import into a no-op.
        let inserted = diesel::insert_into(games::table)
            .values(&row)
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(inserted > 0)
    }
}
