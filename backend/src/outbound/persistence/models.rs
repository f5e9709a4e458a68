//! Internal Diesel row structs.
//!
//! These types never leave the persistence layer. Conversions into domain
//! types validate what the database hands back, since a bad row should fail
//! loudly rather than leak through as a silently wrong value.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Coins, EmailAddress, Game, GameId, PasswordDigest, Purchase, Recharge, RechargeStatus, Rental,
    RentalStatus, User, UserId, UserName, UserRole,
};

use super::schema::{games, idempotency_keys, purchases, recharges, rentals, users};

/// Conversion failure for a row read back from the database.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("corrupt {table} row: {message}")]
pub(crate) struct RowError {
    pub table: &'static str,
    pub message: String,
}

impl RowError {
    fn new(table: &'static str, message: impl ToString) -> Self {
        Self {
            table,
            message: message.to_string(),
        }
    }
}

fn coins(table: &'static str, value: i64) -> Result<Coins, RowError> {
    Coins::try_from(value).map_err(|err| RowError::new(table, err))
}

/// Domain coin amount as a BIGINT column value.
pub(crate) fn coins_to_db(value: Coins) -> Result<i64, String> {
    i64::try_from(value).map_err(|err| err.to_string())
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub coin_balance: i64,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RowError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::from_uuid(row.id),
            name: UserName::new(&row.name).map_err(|err| RowError::new("users", err))?,
            email: EmailAddress::new(&row.email).map_err(|err| RowError::new("users", err))?,
            password: PasswordDigest::new(row.password_hash),
            coin_balance: coins("users", row.coin_balance)?,
            role: UserRole::from_str(&row.role).map_err(|err| RowError::new("users", err))?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub coin_balance: i64,
    pub role: &'a str,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Games
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = games)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GameRow {
    pub id: Uuid,
    pub rawg_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
    pub rating: f64,
    pub price: i64,
}

impl TryFrom<GameRow> for Game {
    type Error = RowError;

    fn try_from(row: GameRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: GameId::from_uuid(row.id),
            rawg_id: row.rawg_id,
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            genres: row.genres,
            platforms: row.platforms,
            rating: row.rating,
            price: coins("games", row.price)?,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = games)]
pub(crate) struct NewGameRow<'a> {
    pub id: Uuid,
    pub rawg_id: Option<i64>,
    pub name: &'a str,
    pub description: &'a str,
    pub image_url: &'a str,
    pub genres: &'a [String],
    pub platforms: &'a [String],
    pub rating: f64,
    pub price: i64,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = purchases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PurchaseRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub price: i64,
    pub purchased_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = RowError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            game_id: GameId::from_uuid(row.game_id),
            price: coins("purchases", row.price)?,
            purchased_at: row.purchased_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = rentals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RentalRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub fee: i64,
    pub rent_at: DateTime<Utc>,
    pub expire_at: DateTime<Utc>,
    pub status: String,
}

impl TryFrom<RentalRow> for Rental {
    type Error = RowError;

    fn try_from(row: RentalRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            game_id: GameId::from_uuid(row.game_id),
            fee: coins("rentals", row.fee)?,
            rent_at: row.rent_at,
            expire_at: row.expire_at,
            stored_status: RentalStatus::from_str(&row.status)
                .map_err(|err| RowError::new("rentals", err))?,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = recharges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RechargeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RechargeRow> for Recharge {
    type Error = RowError;

    fn try_from(row: RechargeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            amount: coins("recharges", row.amount)?,
            status: RechargeStatus::from_str(&row.status)
                .map_err(|err| RowError::new("recharges", err))?,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Idempotency keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = idempotency_keys)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IdempotencyKeyRow {
    pub key: Uuid,
    pub user_id: Uuid,
    pub mutation_type: String,
    pub payload_hash: Vec<u8>,
    pub response_snapshot: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = idempotency_keys)]
pub(crate) struct NewIdempotencyKeyRow<'a> {
    pub key: Uuid,
    pub user_id: Uuid,
    pub mutation_type: &'a str,
    pub payload_hash: &'a [u8],
    pub response_snapshot: &'a serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rental_row(status: &str) -> RentalRow {
        let now = Utc::now();
        RentalRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            game_id: Uuid::new_v4(),
            fee: 50,
            rent_at: now,
            expire_at: now + chrono::TimeDelta::days(3),
            status: status.to_owned(),
        }
    }

    #[rstest]
    fn rental_row_converts_status() {
        let rental = Rental::try_from(rental_row("expired")).expect("valid row");
        assert_eq!(rental.stored_status, RentalStatus::Expired);
        assert_eq!(rental.fee, Coins::new(50));
    }

    #[rstest]
    fn rental_row_rejects_unknown_status() {
        let error = Rental::try_from(rental_row("paused")).expect_err("bad status");
        assert_eq!(error.table, "rentals");
    }

    #[rstest]
    fn negative_balance_is_rejected() {
        let row = UserRow {
            id: Uuid::new_v4(),
            name: "Kim".into(),
            email: "kim@example.com".into(),
            password_hash: "digest".into(),
            coin_balance: -1,
            role: "user".into(),
            created_at: Utc::now(),
        };
        assert!(User::try_from(row).is_err());
    }
}
