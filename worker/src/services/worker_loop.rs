use crate::usecases::{
    expire_unpaid_deposits::ExpireUnpaidDepositsUseCase,
    settle_pending_transfers::SettlePendingTransfersUseCase,
};
use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use crates::domain::repositories::rate_limits::RateLimitRepository;
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

/// Rate-limit windows older than this are dropped on every pass.
const RATE_LIMIT_RETENTION_HOURS: i64 = 24;

pub struct SweepDependencies {
    pub expire_deposits: Arc<ExpireUnpaidDepositsUseCase>,
    pub settle_transfers: Arc<SettlePendingTransfersUseCase>,
    pub rate_limits: Arc<dyn RateLimitRepository + Send + Sync>,
    pub settlement_batch_limit: i64,
}

pub async fn run_worker_loop(deps: SweepDependencies, interval_seconds: u64) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(interval_seconds, "worker_loop: started");
    loop {
        ticker.tick().await;
        run_sweeps(&deps, Utc::now()).await;
    }
}

/// One pass over every sweep. Failures are logged and retried next tick.
pub async fn run_sweeps(deps: &SweepDependencies, now: DateTime<Utc>) {
    if let Err(err) = deps.expire_deposits.run(now, None).await {
        error!(error = ?err, "worker_loop: deposit expiry sweep failed");
    }

    if let Err(err) = deps
        .settle_transfers
        .run(Some(deps.settlement_batch_limit))
        .await
    {
        error!(error = ?err, "worker_loop: settlement sweep failed");
    }

    let cutoff = now - ChronoDuration::hours(RATE_LIMIT_RETENTION_HOURS);
    match deps.rate_limits.purge_windows_before(cutoff).await {
        Ok(0) => {}
        Ok(purged) => info!(purged, "worker_loop: stale rate-limit windows purged"),
        Err(err) => error!(error = ?err, "worker_loop: rate-limit purge failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use crates::domain::repositories::{
        bookings::MockBookingRepository, payouts::MockPayoutGateway,
        rate_limits::MockRateLimitRepository, transfers::MockTransferRepository,
    };
    use mockall::predicate::eq;

    #[tokio::test]
    async fn one_failing_sweep_does_not_stop_the_others() {
        let now = Utc::now();

        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_list_overdue_pending_deposits()
            .times(1)
            .returning(|_, _| Err(anyhow!("statement timeout")));

        let mut transfers = MockTransferRepository::new();
        transfers
            .expect_list_pending()
            .with(eq(Some(25)))
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let mut rate_limits = MockRateLimitRepository::new();
        rate_limits
            .expect_purge_windows_before()
            .with(eq(now - ChronoDuration::hours(RATE_LIMIT_RETENTION_HOURS)))
            .times(1)
            .returning(|_| Ok(3));

        let deps = SweepDependencies {
            expire_deposits: Arc::new(ExpireUnpaidDepositsUseCase::new(Arc::new(bookings))),
            settle_transfers: Arc::new(SettlePendingTransfersUseCase::new(
                Arc::new(transfers),
                Arc::new(MockPayoutGateway::new()),
            )),
            rate_limits: Arc::new(rate_limits),
            settlement_batch_limit: 25,
        };

        run_sweeps(&deps, now).await;
    }
}
