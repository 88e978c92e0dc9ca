use anyhow::Result;
use chrono::{DateTime, Utc};
use crates::domain::repositories::bookings::BookingRepository;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const MAX_REPORTED_IDS: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpireUnpaidDepositsResult {
    pub scanned: usize,
    pub expired: usize,
    pub skipped: usize,
    pub expired_ids: Vec<Uuid>,
}

pub struct ExpireUnpaidDepositsUseCase {
    repository: Arc<dyn BookingRepository + Send + Sync>,
}

impl ExpireUnpaidDepositsUseCase {
    pub fn new(repository: Arc<dyn BookingRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    pub async fn run(
        &self,
        now: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<ExpireUnpaidDepositsResult> {
        let limit = limit.filter(|l| *l > 0);
        let overdue = self
            .repository
            .list_overdue_pending_deposits(now, limit)
            .await?;

        let mut result = ExpireUnpaidDepositsResult {
            scanned: overdue.len(),
            ..Default::default()
        };

        let candidates: Vec<Uuid> = overdue
            .iter()
            .filter(|booking| {
                if booking.deposit_paid {
                    warn!(
                        booking_id = %booking.id,
                        "expire_deposits: deposit already paid; leaving booking untouched"
                    );
                }
                !booking.deposit_paid
            })
            .map(|booking| booking.id)
            .collect();

        if candidates.is_empty() {
            result.skipped = result.scanned;
            info!(scanned = result.scanned, "expire_deposits: nothing to expire");
            return Ok(result);
        }

        let expired = self
            .repository
            .expire_pending_deposits(candidates, now)
            .await?;

        result.expired = expired.len();
        result.skipped = result.scanned - result.expired;
        result.expired_ids = expired.into_iter().take(MAX_REPORTED_IDS).collect();

        info!(
            scanned = result.scanned,
            expired = result.expired,
            skipped = result.skipped,
            "expire_deposits: completed"
        );

        Ok(result)
    }
}
