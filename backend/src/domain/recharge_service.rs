//! Coin top-ups and their history.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::idempotency::{IdempotencyClaim, MutationType};
use crate::domain::idempotent_mutation::{IdempotentMutation, key_claimed, run_idempotent_mutation};
use crate::domain::ports::{
    IdempotencyRepository, RechargeCommand, RechargeLedger, RechargeLedgerError, RechargeQuery,
    RechargeReceipt, RechargeRequest, RechargeResponse,
};
use crate::domain::{Error, Recharge, RechargeAmount, UserId};

fn map_recharge_ledger_error(error: RechargeLedgerError) -> Error {
    match error {
        RechargeLedgerError::Connection { message } => {
            Error::service_unavailable(format!("recharge ledger unavailable: {message}"))
        }
        RechargeLedgerError::Query { message } => {
            Error::internal(format!("recharge ledger error: {message}"))
        }
        RechargeLedgerError::UserNotFound { user_id } => {
            Error::not_found(format!("user {user_id} not found"))
        }
        RechargeLedgerError::BalanceOverflow { .. } => {
            Error::invalid_request("recharge would exceed the maximum balance")
        }
        RechargeLedgerError::KeyClaimed { key } => key_claimed(&key),
    }
}

#[derive(Clone)]
pub struct RechargeService<R, I> {
    ledger: Arc<R>,
    idempotency: Arc<I>,
    clock: Arc<dyn Clock>,
}

impl<R, I> RechargeService<R, I> {
    pub fn new(ledger: Arc<R>, idempotency: Arc<I>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger,
            idempotency,
            clock,
        }
    }
}

impl<R, I> RechargeService<R, I>
where
    R: RechargeLedger,
    I: IdempotencyRepository,
{
    async fn perform_recharge(
        &self,
        user_id: &UserId,
        amount: RechargeAmount,
        claim: Option<IdempotencyClaim>,
    ) -> Result<RechargeReceipt, Error> {
        let recharge = Recharge::succeeded(user_id.clone(), amount, self.clock.utc());
        let balance = self
            .ledger
            .record(&recharge, claim.as_ref())
            .await
            .map_err(map_recharge_ledger_error)?;
        info!(
            user_id = %recharge.user_id,
            amount = %recharge.amount,
            balance = %balance,
            "balance recharged"
        );
        Ok(RechargeReceipt { recharge, balance })
    }
}

#[async_trait]
impl<R, I> RechargeCommand for RechargeService<R, I>
where
    R: RechargeLedger,
    I: IdempotencyRepository,
{
    async fn recharge(&self, request: RechargeRequest) -> Result<RechargeResponse, Error> {
        let amount = RechargeAmount::new(request.amount)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let mutation = IdempotentMutation {
            idempotency_key: request.idempotency_key.clone(),
            user_id: request.user_id.clone(),
            mutation_type: MutationType::Recharge,
            payload: json!({ "amount": request.amount }),
        };
        let (receipt, replayed) = run_idempotent_mutation(
            self.idempotency.as_ref(),
            self.clock.as_ref(),
            mutation,
            |claim| self.perform_recharge(&request.user_id, amount, claim),
        )
        .await?;
        Ok(RechargeResponse { receipt, replayed })
    }
}

#[async_trait]
impl<R, I> RechargeQuery for RechargeService<R, I>
where
    R: RechargeLedger,
    I: IdempotencyRepository,
{
    async fn history(&self, user_id: &UserId) -> Result<Vec<Recharge>, Error> {
        self.ledger
            .history(user_id)
            .await
            .map_err(map_recharge_ledger_error)
    }
}
