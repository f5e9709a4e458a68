//! PostgreSQL-backed `TransactionLedger`.
//!
//! Purchases and rentals are written in one database transaction together
//! with the balance debit. The debit is a conditional update
//! (`coin_balance >= amount`), so two concurrent requests can never both
//! spend the same coins: the second one updates zero rows and the whole
//! transaction rolls back.
//!
//! A keyed request reserves its idempotency row before the debit and fills
//! in the replayable receipt before commit. A second request with the same
//! key waits on that row, finds it taken, and rolls back without touching
//! the balance.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::idempotency::IdempotencyClaim;
use crate::domain::ports::{
    PurchaseReceipt, RentalReceipt, TransactionLedger, TransactionLedgerError,
};
use crate::domain::{Coins, GameId, Purchase, Rental, RentalStatus, UserId};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error};
use super::diesel_idempotency_repository::{complete_claim, reserve_claim};
use super::models::{PurchaseRow, RentalRow, coins_to_db};
use super::pool::{DbPool, PoolError};
use super::schema::{purchases, rentals, users};

#[derive(Clone)]
pub struct DieselTransactionLedger {
    pool: DbPool,
}

impl DieselTransactionLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failures raised inside the debit transaction.
#[derive(Debug)]
enum DebitError {
    Diesel(diesel::result::Error),
    UserNotFound,
    Insufficient { required: i64, available: i64 },
    KeyClaimed(String),
    Snapshot(String),
}

impl From<diesel::result::Error> for DebitError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> TransactionLedgerError {
    TransactionLedgerError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> TransactionLedgerError {
    match classify_diesel_error(error) {
        DieselFailure::ConnectionLost => {
            TransactionLedgerError::connection("database connection error")
        }
        failure => TransactionLedgerError::query(failure.message()),
    }
}

fn map_debit_error(error: DebitError, user_id: &UserId) -> TransactionLedgerError {
    match error {
        DebitError::Diesel(error) => map_diesel_error(error),
        DebitError::UserNotFound => TransactionLedgerError::user_not_found(user_id.to_string()),
        DebitError::Insufficient {
            required,
            available,
        } => TransactionLedgerError::insufficient_funds(
            u64::try_from(required).unwrap_or_default(),
            u64::try_from(available).unwrap_or_default(),
        ),
        DebitError::KeyClaimed(key) => TransactionLedgerError::key_claimed(key),
        DebitError::Snapshot(message) => TransactionLedgerError::query(message),
    }
}

fn row_error(error: impl ToString) -> TransactionLedgerError {
    TransactionLedgerError::query(error.to_string())
}

/// Take the idempotency row for `claim` ahead of any balance change.
async fn reserve(
    conn: &mut AsyncPgConnection,
    claim: Option<&IdempotencyClaim>,
) -> Result<(), DebitError> {
    let Some(claim) = claim else {
        return Ok(());
    };
    if reserve_claim(conn, claim).await? {
        Ok(())
    } else {
        Err(DebitError::KeyClaimed(claim.key.to_string()))
    }
}

/// Store the receipt a retry with the same key replays.
async fn settle<T, F>(
    conn: &mut AsyncPgConnection,
    claim: Option<&IdempotencyClaim>,
    balance: i64,
    receipt: F,
) -> Result<(), DebitError>
where
    T: serde::Serialize,
    F: FnOnce(Coins) -> T,
{
    let Some(claim) = claim else {
        return Ok(());
    };
    let balance = Coins::try_from(balance).map_err(|err| DebitError::Snapshot(err.to_string()))?;
    let record = claim
        .to_record(&receipt(balance))
        .map_err(|err| DebitError::Snapshot(err.to_string()))?;
    complete_claim(conn, &record).await?;
    Ok(())
}

/// Subtract `amount` from the user's balance if it covers it.
async fn debit(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    amount: i64,
) -> Result<i64, DebitError> {
    let remaining: Option<i64> = diesel::update(
        users::table
            .filter(users::id.eq(user_id))
            .filter(users::coin_balance.ge(amount)),
    )
    .set(users::coin_balance.eq(users::coin_balance - amount))
    .returning(users::coin_balance)
    .get_result(conn)
    .await
    .optional()?;

    if let Some(remaining) = remaining {
        return Ok(remaining);
    }

    let available: Option<i64> = users::table
        .filter(users::id.eq(user_id))
        .select(users::coin_balance)
        .first(conn)
        .await
        .optional()?;
    match available {
        None => Err(DebitError::UserNotFound),
        Some(available) => Err(DebitError::Insufficient {
            required: amount,
            available,
        }),
    }
}

#[async_trait]
impl TransactionLedger for DieselTransactionLedger {
    async fn record_purchase<'a>(
        &self,
        purchase: &Purchase,
        claim: Option<&'a IdempotencyClaim>,
    ) -> Result<Coins, TransactionLedgerError> {
        let row = PurchaseRow {
            id: purchase.id,
            user_id: *purchase.user_id.as_uuid(),
            game_id: *purchase.game_id.as_uuid(),
            price: coins_to_db(purchase.price).map_err(TransactionLedgerError::query)?,
            purchased_at: purchase.purchased_at,
        };
        let mut pooled = self.pool.get().await.map_err(map_pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        let balance = conn
            .transaction::<_, DebitError, _>(|conn| {
                async move {
                    reserve(conn, claim).await?;
                    let balance = debit(conn, row.user_id, row.price).await?;
                    diesel::insert_into(purchases::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    settle(conn, claim, balance, |balance| PurchaseReceipt {
                        purchase: purchase.clone(),
                        balance,
                    })
                    .await?;
                    Ok(balance)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_debit_error(err, &purchase.user_id))?;

        debug!(purchase_id = %purchase.id, balance, "purchase committed");
        Coins::try_from(balance).map_err(row_error)
    }

    async fn record_rental<'a>(
        &self,
        rental: &Rental,
        claim: Option<&'a IdempotencyClaim>,
    ) -> Result<Coins, TransactionLedgerError> {
        let row = RentalRow {
            id: rental.id,
            user_id: *rental.user_id.as_uuid(),
            game_id: *rental.game_id.as_uuid(),
            fee: coins_to_db(rental.fee).map_err(TransactionLedgerError::query)?,
            rent_at: rental.rent_at,
            expire_at: rental.expire_at,
            status: rental.stored_status.as_str().to_owned(),
        };
        let mut pooled = self.pool.get().await.map_err(map_pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        let balance = conn
            .transaction::<_, DebitError, _>(|conn| {
                async move {
                    reserve(conn, claim).await?;
                    let balance = debit(conn, row.user_id, row.fee).await?;
                    diesel::insert_into(rentals::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    settle(conn, claim, balance, |balance| RentalReceipt {
                        rental: rental.clone(),
                        balance,
                    })
                    .await?;
                    Ok(balance)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_debit_error(err, &rental.user_id))?;

        debug!(rental_id = %rental.id, balance, "rental committed");
        Coins::try_from(balance).map_err(row_error)
    }

    async fn purchases_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Purchase>, TransactionLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = purchases::table
            .filter(purchases::user_id.eq(user_id.as_uuid()))
            .order((purchases::purchased_at.asc(), purchases::id.asc()))
            .select(PurchaseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| Purchase::try_from(row).map_err(row_error))
            .collect()
    }

    async fn rentals_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Rental>, TransactionLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = rentals::table
            .filter(rentals::user_id.eq(user_id.as_uuid()))
            .order((rentals::rent_at.asc(), rentals::id.asc()))
            .select(RentalRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| Rental::try_from(row).map_err(row_error))
            .collect()
    }

    async fn latest_active_rental(
        &self,
        user_id: &UserId,
        game_id: &GameId,
    ) -> Result<Option<Rental>, TransactionLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = rentals::table
            .filter(rentals::user_id.eq(user_id.as_uuid()))
            .filter(rentals::game_id.eq(game_id.as_uuid()))
            .filter(rentals::status.eq(RentalStatus::Active.as_str()))
            .order(rentals::expire_at.desc())
            .select(RentalRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| Rental::try_from(row).map_err(row_error))
            .transpose()
    }

    async fn mark_expired_rentals(&self, now: DateTime<Utc>) -> Result<u64, TransactionLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            rentals::table
                .filter(rentals::status.eq(RentalStatus::Active.as_str()))
                .filter(rentals::expire_at.le(now)),
        )
        .set(rentals::status.eq(RentalStatus::Expired.as_str()))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(u64::try_from(updated).unwrap_or(u64::MAX))
    }
}
