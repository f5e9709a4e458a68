//! Periodic cleanup of derived state.
//!
//! Rental liveness is always computed from `expire_at`, so the sweep only
//! converges the stored status hint. Idempotency records older than the
//! configured TTL are dropped in the same pass.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::Error;
use crate::domain::idempotency::IdempotencyConfig;
use crate::domain::idempotent_mutation::map_idempotency_error;
use crate::domain::ports::{IdempotencyRepository, TransactionLedger};
use crate::domain::transaction_service::map_ledger_error;

/// Rows touched by one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    pub rentals_expired: u64,
    pub idempotency_records_removed: u64,
}

#[derive(Clone)]
pub struct HousekeepingService<L, I> {
    ledger: Arc<L>,
    idempotency: Arc<I>,
    config: IdempotencyConfig,
    clock: Arc<dyn Clock>,
}

impl<L, I> HousekeepingService<L, I>
where
    L: TransactionLedger,
    I: IdempotencyRepository,
{
    pub fn new(
        ledger: Arc<L>,
        idempotency: Arc<I>,
        config: IdempotencyConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            idempotency,
            config,
            clock,
        }
    }

    pub async fn sweep(&self) -> Result<SweepReport, Error> {
        let rentals_expired = self
            .ledger
            .mark_expired_rentals(self.clock.utc())
            .await
            .map_err(map_ledger_error)?;
        let idempotency_records_removed = self
            .idempotency
            .cleanup_expired(self.config.ttl())
            .await
            .map_err(map_idempotency_error)?;

        if rentals_expired > 0 || idempotency_records_removed > 0 {
            info!(rentals_expired, idempotency_records_removed, "housekeeping sweep");
        }
        Ok(SweepReport {
            rentals_expired,
            idempotency_records_removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::ErrorCode;
    use crate::domain::ports::{
        MockIdempotencyRepository, MockTransactionLedger, TransactionLedgerError,
    };
    use crate::test_support::MutableClock;
    use chrono::{TimeZone, Utc};
    use mockall::predicate::eq;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn sweep_expires_rentals_and_prunes_idempotency_records() {
        let now = Utc
            .with_ymd_and_hms(2026, 5, 1, 0, 0, 0)
            .single()
            .expect("timestamp");
        let mut ledger = MockTransactionLedger::new();
        ledger
            .expect_mark_expired_rentals()
            .with(eq(now))
            .times(1)
            .returning(|_| Ok(3));
        let mut idempotency = MockIdempotencyRepository::new();
        idempotency
            .expect_cleanup_expired()
            .with(eq(Duration::from_secs(7200)))
            .times(1)
            .returning(|_| Ok(5));

        let service = HousekeepingService::new(
            Arc::new(ledger),
            Arc::new(idempotency),
            IdempotencyConfig::with_ttl(Duration::from_secs(7200)),
            Arc::new(MutableClock::new(now)),
        );
        let report = service.sweep().await.expect("sweep");

        assert_eq!(
            report,
            SweepReport {
                rentals_expired: 3,
                idempotency_records_removed: 5,
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn sweep_stops_when_ledger_is_unreachable() {
        let mut ledger = MockTransactionLedger::new();
        ledger
            .expect_mark_expired_rentals()
            .returning(|_| Err(TransactionLedgerError::connection("refused")));
        let mut idempotency = MockIdempotencyRepository::new();
        idempotency.expect_cleanup_expired().never();

        let service = HousekeepingService::new(
            Arc::new(ledger),
            Arc::new(idempotency),
            IdempotencyConfig::default(),
            Arc::new(MutableClock::new(Utc::now())),
        );
        let error = service.sweep().await.expect_err("unreachable");
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    }
}
