//! Buy, rent, and library HTTP handlers.
//!
//! ```text
//! POST /buy/{game_id}            Idempotency-Key: <uuid> (optional)
//! POST /rent/{game_id}           Idempotency-Key: <uuid> (optional)
//! GET /rental/check/{game_id}
//! GET /api/my-purchases
//! GET /api/my-rentals
//! GET /api/my-games
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{BuyGameResponse, GameTransactionRequest, RentGameResponse};
use crate::domain::{
    GameSummary, OwnedGame, Purchase, PurchasedGame, Rental, RentalCheck, RentedGame,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::games::parse_game_id;
use crate::inbound::http::idempotency::IdempotencyHeader;
use crate::inbound::http::identity::AuthenticatedUser;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Purchase ledger entry.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub game_id: String,
    /// Price paid, fixed at purchase time.
    pub price: u64,
    #[schema(format = "date-time")]
    pub purchased_at: String,
}

impl From<Purchase> for PurchaseBody {
    fn from(value: Purchase) -> Self {
        Self {
            id: value.id.to_string(),
            game_id: value.game_id.to_string(),
            price: value.price.value(),
            purchased_at: value.purchased_at.to_rfc3339(),
        }
    }
}

/// Rental ledger entry.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RentalBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub game_id: String,
    pub fee: u64,
    #[schema(format = "date-time")]
    pub rent_at: String,
    #[schema(format = "date-time")]
    pub expire_at: String,
}

impl From<Rental> for RentalBody {
    fn from(value: Rental) -> Self {
        Self {
            id: value.id.to_string(),
            game_id: value.game_id.to_string(),
            fee: value.fee.value(),
            rent_at: value.rent_at.to_rfc3339(),
            expire_at: value.expire_at.to_rfc3339(),
        }
    }
}

/// Result of `POST /buy/{game_id}`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuyGameResponseBody {
    pub purchase: PurchaseBody,
    /// Balance left after the debit.
    pub balance: u64,
    /// True when the response was served from an earlier request with the
    /// same idempotency key.
    pub replayed: bool,
}

impl From<BuyGameResponse> for BuyGameResponseBody {
    fn from(value: BuyGameResponse) -> Self {
        Self {
            purchase: PurchaseBody::from(value.receipt.purchase),
            balance: value.receipt.balance.value(),
            replayed: value.replayed,
        }
    }
}

/// Result of `POST /rent/{game_id}`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RentGameResponseBody {
    pub rental: RentalBody,
    pub balance: u64,
    pub replayed: bool,
}

impl From<RentGameResponse> for RentGameResponseBody {
    fn from(value: RentGameResponse) -> Self {
        Self {
            rental: RentalBody::from(value.receipt.rental),
            balance: value.receipt.balance.value(),
            replayed: value.replayed,
        }
    }
}

/// Whether the caller currently holds a live rental.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RentalCheckResponseBody {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(format = "date-time")]
    pub expire_at: Option<String>,
}

impl From<RentalCheck> for RentalCheckResponseBody {
    fn from(value: RentalCheck) -> Self {
        Self {
            active: value.active,
            expire_at: value.expire_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Catalog fields shown beside a ledger entry.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameSummaryBody {
    #[schema(format = "uuid")]
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub price: u64,
}

impl From<GameSummary> for GameSummaryBody {
    fn from(value: GameSummary) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            image_url: value.image_url,
            price: value.price.value(),
        }
    }
}

/// Purchase history entry; `game` is null once the game leaves the catalog.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchasedGameBody {
    #[schema(format = "uuid")]
    pub purchase_id: String,
    pub price: u64,
    #[schema(format = "date-time")]
    pub purchased_at: String,
    pub game: Option<GameSummaryBody>,
}

impl From<PurchasedGame> for PurchasedGameBody {
    fn from(value: PurchasedGame) -> Self {
        Self {
            purchase_id: value.purchase_id.to_string(),
            price: value.price.value(),
            purchased_at: value.purchased_at.to_rfc3339(),
            game: value.game.map(GameSummaryBody::from),
        }
    }
}

/// Rental history entry with the status derived at read time.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RentedGameBody {
    #[schema(format = "uuid")]
    pub rental_id: String,
    pub fee: u64,
    #[schema(format = "date-time")]
    pub rent_at: String,
    #[schema(format = "date-time")]
    pub expire_at: String,
    #[schema(example = "active")]
    pub status: String,
    pub game: Option<GameSummaryBody>,
}

impl From<RentedGame> for RentedGameBody {
    fn from(value: RentedGame) -> Self {
        Self {
            rental_id: value.rental_id.to_string(),
            fee: value.fee.value(),
            rent_at: value.rent_at.to_rfc3339(),
            expire_at: value.expire_at.to_rfc3339(),
            status: value.status.as_str().to_owned(),
            game: value.game.map(GameSummaryBody::from),
        }
    }
}

/// One distinct game in the caller's library.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnedGameBody {
    #[schema(format = "uuid")]
    pub game_id: String,
    pub name: String,
    pub image_url: String,
    pub price: u64,
    pub is_purchased: bool,
    /// Set for any rental, live or expired.
    pub is_rented: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(format = "date-time")]
    pub expire_at: Option<String>,
}

impl From<OwnedGame> for OwnedGameBody {
    fn from(value: OwnedGame) -> Self {
        Self {
            game_id: value.game_id.to_string(),
            name: value.name,
            image_url: value.image_url,
            price: value.price.value(),
            is_purchased: value.is_purchased,
            is_rented: value.is_rented,
            expire_at: value.expire_at.map(|at| at.to_rfc3339()),
        }
    }
}

fn transaction_request(
    user: &AuthenticatedUser,
    raw_game_id: &str,
    idempotency: IdempotencyHeader,
) -> ApiResult<GameTransactionRequest> {
    Ok(GameTransactionRequest {
        user_id: user.user_id().clone(),
        game_id: parse_game_id(raw_game_id)?,
        idempotency_key: idempotency.into_inner(),
    })
}

/// Buy a game at its current catalog price.
#[utoipa::path(
    post,
    path = "/buy/{game_id}",
    params(
        ("game_id" = String, Path, format = "uuid", description = "Game to buy"),
        ("Idempotency-Key" = Option<String>, Header, format = "uuid",
            description = "Replays the original response when retried")
    ),
    responses(
        (status = 200, description = "Game purchased", body = BuyGameResponseBody),
        (status = 400, description = "Insufficient funds or invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Unknown game or user", body = ErrorSchema),
        (status = 409, description = "Idempotency key reused with another game", body = ErrorSchema)
    ),
    tags = ["transactions"],
    operation_id = "buyGame",
    security(("BearerToken" = []))
)]
#[post("/buy/{game_id}")]
pub async fn buy_game(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    idempotency: IdempotencyHeader,
    path: web::Path<String>,
) -> ApiResult<web::Json<BuyGameResponseBody>> {
    let request = transaction_request(&user, &path.into_inner(), idempotency)?;
    let response = state.transactions.buy(request).await?;
    Ok(web::Json(BuyGameResponseBody::from(response)))
}

/// Rent a game for three days at a tenth of its price.
#[utoipa::path(
    post,
    path = "/rent/{game_id}",
    params(
        ("game_id" = String, Path, format = "uuid", description = "Game to rent"),
        ("Idempotency-Key" = Option<String>, Header, format = "uuid",
            description = "Replays the original response when retried")
    ),
    responses(
        (status = 200, description = "Game rented", body = RentGameResponseBody),
        (status = 400, description = "Insufficient funds or invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Unknown game or user", body = ErrorSchema),
        (status = 409, description = "Idempotency key reused with another game", body = ErrorSchema)
    ),
    tags = ["transactions"],
    operation_id = "rentGame",
    security(("BearerToken" = []))
)]
#[post("/rent/{game_id}")]
pub async fn rent_game(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    idempotency: IdempotencyHeader,
    path: web::Path<String>,
) -> ApiResult<web::Json<RentGameResponseBody>> {
    let request = transaction_request(&user, &path.into_inner(), idempotency)?;
    let response = state.transactions.rent(request).await?;
    Ok(web::Json(RentGameResponseBody::from(response)))
}

/// Report whether the caller's latest rental of a game is still live.
#[utoipa::path(
    get,
    path = "/rental/check/{game_id}",
    params(("game_id" = String, Path, format = "uuid", description = "Rented game")),
    responses(
        (status = 200, description = "Rental state", body = RentalCheckResponseBody),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema)
    ),
    tags = ["transactions"],
    operation_id = "checkRental",
    security(("BearerToken" = []))
)]
#[get("/rental/check/{game_id}")]
pub async fn check_rental(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<RentalCheckResponseBody>> {
    let game_id = parse_game_id(&path.into_inner())?;
    let check = state
        .library
        .check_active_rental(user.user_id(), &game_id)
        .await?;
    Ok(web::Json(RentalCheckResponseBody::from(check)))
}

/// Purchase history in ledger order.
#[utoipa::path(
    get,
    path = "/api/my-purchases",
    responses(
        (status = 200, description = "Purchases", body = [PurchasedGameBody]),
        (status = 401, description = "Unauthorized", body = ErrorSchema)
    ),
    tags = ["library"],
    operation_id = "listPurchases",
    security(("BearerToken" = []))
)]
#[get("/api/my-purchases")]
pub async fn my_purchases(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<PurchasedGameBody>>> {
    let purchases = state.library.list_purchases(user.user_id()).await?;
    Ok(web::Json(
        purchases.into_iter().map(PurchasedGameBody::from).collect(),
    ))
}

/// Rental history in ledger order.
#[utoipa::path(
    get,
    path = "/api/my-rentals",
    responses(
        (status = 200, description = "Rentals", body = [RentedGameBody]),
        (status = 401, description = "Unauthorized", body = ErrorSchema)
    ),
    tags = ["library"],
    operation_id = "listRentals",
    security(("BearerToken" = []))
)]
#[get("/api/my-rentals")]
pub async fn my_rentals(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<RentedGameBody>>> {
    let rentals = state.library.list_rentals(user.user_id()).await?;
    Ok(web::Json(rentals.into_iter().map(RentedGameBody::from).collect()))
}

/// Every distinct game the caller has bought or rented.
#[utoipa::path(
    get,
    path = "/api/my-games",
    responses(
        (status = 200, description = "Library", body = [OwnedGameBody]),
        (status = 401, description = "Unauthorized", body = ErrorSchema)
    ),
    tags = ["library"],
    operation_id = "listUserGames",
    security(("BearerToken" = []))
)]
#[get("/api/my-games")]
pub async fn my_games(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<OwnedGameBody>>> {
    let games = state.library.user_games(user.user_id()).await?;
    Ok(web::Json(games.into_iter().map(OwnedGameBody::from).collect()))
}

#[cfg(test)]
#[path = "transactions_tests.rs"]
mod tests;
