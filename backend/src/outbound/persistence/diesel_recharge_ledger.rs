//! PostgreSQL-backed `RechargeLedger`.
//!
//! The recharge row and the balance credit share one transaction, so a
//! recorded success always matches the balance. A keyed recharge reserves
//! its idempotency row first and stores the replayable receipt before
//! commit.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::idempotency::IdempotencyClaim;
use crate::domain::ports::{RechargeLedger, RechargeLedgerError, RechargeReceipt};
use crate::domain::{Coins, Recharge, UserId};

use super::diesel_error_mapping::{classify_diesel_error, map_basic_failure};
use super::diesel_idempotency_repository::{complete_claim, reserve_claim};
use super::models::{RechargeRow, coins_to_db};
use super::pool::{DbPool, PoolError};
use super::schema::{recharges, users};

#[derive(Clone)]
pub struct DieselRechargeLedger {
    pool: DbPool,
}

impl DieselRechargeLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug)]
enum CreditError {
    Diesel(diesel::result::Error),
    UserNotFound,
    Overflow,
    KeyClaimed(String),
    Snapshot(String),
}

impl From<diesel::result::Error> for CreditError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> RechargeLedgerError {
    RechargeLedgerError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> RechargeLedgerError {
    map_basic_failure(
        classify_diesel_error(error),
        RechargeLedgerError::query,
        RechargeLedgerError::connection,
    )
}

fn map_credit_error(error: CreditError, user_id: &UserId) -> RechargeLedgerError {
    match error {
        CreditError::Diesel(error) => map_diesel_error(error),
        CreditError::UserNotFound => RechargeLedgerError::user_not_found(user_id.to_string()),
        CreditError::Overflow => RechargeLedgerError::balance_overflow(user_id.to_string()),
        CreditError::KeyClaimed(key) => RechargeLedgerError::key_claimed(key),
        CreditError::Snapshot(message) => RechargeLedgerError::query(message),
    }
}

async fn credit(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    amount: i64,
) -> Result<i64, CreditError> {
    let headroom = i64::MAX - amount;
    let balance: Option<i64> = diesel::update(
        users::table
            .filter(users::id.eq(user_id))
            .filter(users::coin_balance.le(headroom)),
    )
    .set(users::coin_balance.eq(users::coin_balance + amount))
    .returning(users::coin_balance)
    .get_result(conn)
    .await
    .optional()?;

    if let Some(balance) = balance {
        return Ok(balance);
    }

    let exists: i64 = users::table
        .filter(users::id.eq(user_id))
        .count()
        .get_result(conn)
        .await?;
    if exists == 0 {
        Err(CreditError::UserNotFound)
    } else {
        Err(CreditError::Overflow)
    }
}

#[async_trait]
impl RechargeLedger for DieselRechargeLedger {
    async fn record<'a>(
        &self,
        recharge: &Recharge,
        claim: Option<&'a IdempotencyClaim>,
    ) -> Result<Coins, RechargeLedgerError> {
        let row = RechargeRow {
            id: recharge.id,
            user_id: *recharge.user_id.as_uuid(),
            amount: coins_to_db(recharge.amount).map_err(RechargeLedgerError::query)?,
            status: recharge.status.as_str().to_owned(),
            created_at: recharge.created_at,
        };
        let mut pooled = self.pool.get().await.map_err(map_pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        let balance = conn
            .transaction::<_, CreditError, _>(|conn| {
                async move {
                    if let Some(claim) = claim {
                        if !reserve_claim(conn, claim).await? {
                            return Err(CreditError::KeyClaimed(claim.key.to_string()));
                        }
                    }
                    let balance = credit(conn, row.user_id, row.amount).await?;
                    diesel::insert_into(recharges::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    if let Some(claim) = claim {
                        let receipt = RechargeReceipt {
                            recharge: recharge.clone(),
                            balance: Coins::try_from(balance)
                                .map_err(|err| CreditError::Snapshot(err.to_string()))?,
                        };
                        let record = claim
                            .to_record(&receipt)
                            .map_err(|err| CreditError::Snapshot(err.to_string()))?;
                        complete_claim(conn, &record).await?;
                    }
                    Ok(balance)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_credit_error(err, &recharge.user_id))?;

        debug!(recharge_id = %recharge.id, balance, "recharge committed");
        Coins::try_from(balance).map_err(|err| RechargeLedgerError::query(err.to_string()))
    }

    async fn history(&self, user_id: &UserId) -> Result<Vec<Recharge>, RechargeLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = recharges::table
            .filter(recharges::user_id.eq(user_id.as_uuid()))
            .order((recharges::created_at.desc(), recharges::id.desc()))
            .select(RechargeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| {
                Recharge::try_from(row).map_err(|err| RechargeLedgerError::query(err.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CreditError::UserNotFound, "does not exist")]
    #[case(CreditError::Overflow, "overflow")]
    fn credit_errors_name_the_user(#[case] error: CreditError, #[case] fragment: &str) {
        let user_id = UserId::random();
        let mapped = map_credit_error(error, &user_id);
        let text = mapped.to_string();
        assert!(text.contains(fragment), "{text}");
        assert!(text.contains(user_id.as_ref()), "{text}");
    }

    #[rstest]
    fn taken_claim_maps_to_key_claimed() {
        let mapped = map_credit_error(CreditError::KeyClaimed("k-9".into()), &UserId::random());
        assert_eq!(mapped, RechargeLedgerError::key_claimed("k-9"));
    }
}
