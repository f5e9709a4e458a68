//! Catalog HTTP handlers.
//!
//! ```text
//! GET /games?page=1&limit=20
//! GET /games/{id}
//! POST /games            (admin)
//! DELETE /games/{id}     (admin)
//! POST /games/sync       (admin)
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{SyncReport, SyncRequest};
use crate::domain::{Coins, Error, Game, GameDraft, GameId, GamePage, PageRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::AdminUser;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Paging query for `GET /games`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListGamesQuery {
    /// One-based page number; defaults to 1.
    pub page: Option<u32>,
    /// Page size between 1 and 100; defaults to 20.
    pub limit: Option<u32>,
}

/// Catalog entry.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameResponseBody {
    #[schema(format = "uuid")]
    pub id: String,
    pub rawg_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
    pub rating: f64,
    pub price: u64,
}

impl From<Game> for GameResponseBody {
    fn from(value: Game) -> Self {
        Self {
            id: value.id.to_string(),
            rawg_id: value.rawg_id,
            name: value.name,
            description: value.description,
            image_url: value.image_url,
            genres: value.genres,
            platforms: value.platforms,
            rating: value.rating,
            price: value.price.value(),
        }
    }
}

/// One page of the catalog.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GamePageResponseBody {
    pub games: Vec<GameResponseBody>,
    pub page: u32,
    pub total_pages: u64,
    pub total_games: u64,
}

impl From<GamePage> for GamePageResponseBody {
    fn from(value: GamePage) -> Self {
        Self {
            games: value.games.into_iter().map(GameResponseBody::from).collect(),
            page: value.page,
            total_pages: value.total_pages,
            total_games: value.total_games,
        }
    }
}

/// Fields for a hand-curated catalog entry.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequestBody {
    #[schema(example = "Celeste")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[schema(minimum = 0.0, maximum = 5.0)]
    pub rating: f64,
    #[schema(minimum = 0, example = 300)]
    pub price: i64,
}

impl TryFrom<CreateGameRequestBody> for GameDraft {
    type Error = Error;

    fn try_from(value: CreateGameRequestBody) -> Result<Self, Self::Error> {
        let price = u64::try_from(value.price).map_err(|_| {
            Error::invalid_request("price must not be negative")
                .with_details(json!({ "field": "price", "code": "negative_price" }))
        })?;
        Ok(Self {
            name: value.name,
            description: value.description,
            image_url: value.image_url,
            genres: value.genres,
            platforms: value.platforms,
            rating: value.rating,
            price: Coins::new(price),
        })
    }
}

/// Import window for `POST /games/sync`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncCatalogRequestBody {
    /// Number of feed pages to read; defaults to 1.
    pub pages: Option<u32>,
    /// Games per feed page; defaults to 40.
    pub page_size: Option<u32>,
}

impl From<SyncCatalogRequestBody> for SyncRequest {
    fn from(value: SyncCatalogRequestBody) -> Self {
        let defaults = SyncRequest::default();
        Self {
            pages: value.pages.unwrap_or(defaults.pages),
            page_size: value.page_size.unwrap_or(defaults.page_size),
        }
    }
}

/// Outcome of a catalog import.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncReportResponseBody {
    pub fetched: u64,
    pub imported: u64,
    pub skipped: u64,
}

impl From<SyncReport> for SyncReportResponseBody {
    fn from(value: SyncReport) -> Self {
        Self {
            fetched: value.fetched,
            imported: value.imported,
            skipped: value.skipped,
        }
    }
}

/// Parse a game identifier taken from the request path.
pub(crate) fn parse_game_id(raw: &str) -> Result<GameId, Error> {
    GameId::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "gameId", "value": raw, "code": "invalid_uuid" }))
    })
}

/// List catalog games, sorted by name.
#[utoipa::path(
    get,
    path = "/games",
    params(ListGamesQuery),
    responses(
        (status = 200, description = "Catalog page", body = GamePageResponseBody),
        (status = 400, description = "Invalid paging parameters", body = ErrorSchema)
    ),
    tags = ["games"],
    operation_id = "listGames",
    security([])
)]
#[get("/games")]
pub async fn list_games(
    state: web::Data<HttpState>,
    query: web::Query<ListGamesQuery>,
) -> ApiResult<web::Json<GamePageResponseBody>> {
    let ListGamesQuery { page, limit } = query.into_inner();
    let request = PageRequest::new(page, limit).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({ "code": "invalid_paging" }))
    })?;
    let page = state.catalog.list_games(request).await?;
    Ok(web::Json(GamePageResponseBody::from(page)))
}

/// Fetch one catalog game.
#[utoipa::path(
    get,
    path = "/games/{id}",
    params(("id" = String, Path, format = "uuid", description = "Game identifier")),
    responses(
        (status = 200, description = "Game", body = GameResponseBody),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 404, description = "Unknown game", body = ErrorSchema)
    ),
    tags = ["games"],
    operation_id = "getGame",
    security([])
)]
#[get("/games/{id}")]
pub async fn get_game(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<GameResponseBody>> {
    let id = parse_game_id(&path.into_inner())?;
    let game = state.catalog.get_game(&id).await?;
    Ok(web::Json(GameResponseBody::from(game)))
}

/// Add a game to the catalog.
#[utoipa::path(
    post,
    path = "/games",
    request_body = CreateGameRequestBody,
    responses(
        (status = 201, description = "Game created", body = GameResponseBody),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema)
    ),
    tags = ["games"],
    operation_id = "createGame",
    security(("BearerToken" = []))
)]
#[post("/games")]
pub async fn create_game(
    state: web::Data<HttpState>,
    admin: AdminUser,
    payload: web::Json<CreateGameRequestBody>,
) -> ApiResult<HttpResponse> {
    let draft = GameDraft::try_from(payload.into_inner())?;
    let game = state.catalog_admin.create_game(draft).await?;
    info!(admin_id = %admin.user_id(), game_id = %game.id, "catalog game created");
    Ok(HttpResponse::Created().json(GameResponseBody::from(game)))
}

/// Remove a game from the catalog. Ledger history is kept.
#[utoipa::path(
    delete,
    path = "/games/{id}",
    params(("id" = String, Path, format = "uuid", description = "Game identifier")),
    responses(
        (status = 204, description = "Game removed"),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 404, description = "Unknown game", body = ErrorSchema)
    ),
    tags = ["games"],
    operation_id = "deleteGame",
    security(("BearerToken" = []))
)]
#[delete("/games/{id}")]
pub async fn delete_game(
    state: web::Data<HttpState>,
    admin: AdminUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_game_id(&path.into_inner())?;
    state.catalog_admin.delete_game(&id).await?;
    info!(admin_id = %admin.user_id(), game_id = %id, "catalog game deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Import games from the RAWG feed.
///
/// The body is optional; an empty request imports one page of 40 games.
#[utoipa::path(
    post,
    path = "/games/sync",
    request_body(content = Option<SyncCatalogRequestBody>),
    responses(
        (status = 200, description = "Import finished", body = SyncReportResponseBody),
        (status = 400, description = "Invalid import window", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 503, description = "Feed unavailable", body = ErrorSchema)
    ),
    tags = ["games"],
    operation_id = "syncCatalog",
    security(("BearerToken" = []))
)]
#[post("/games/sync")]
pub async fn sync_catalog(
    state: web::Data<HttpState>,
    admin: AdminUser,
    payload: Option<web::Json<SyncCatalogRequestBody>>,
) -> ApiResult<web::Json<SyncReportResponseBody>> {
    let request = SyncRequest::from(payload.map(web::Json::into_inner).unwrap_or_default());
    info!(
        admin_id = %admin.user_id(),
        pages = request.pages,
        page_size = request.page_size,
        "catalog sync requested"
    );
    let report = state.catalog_admin.sync(request).await?;
    Ok(web::Json(SyncReportResponseBody::from(report)))
}

#[cfg(test)]
#[path = "games_tests.rs"]
mod tests;
