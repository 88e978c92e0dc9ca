use anyhow::Result;
use crates::domain::repositories::{payouts::PayoutGateway, transfers::TransferRepository};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

const MAX_REPORTED_IDS: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettlePendingTransfersResult {
    pub scanned: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped_claimed: usize,
    pub completed_ids: Vec<Uuid>,
    pub failed_ids: Vec<Uuid>,
}

pub struct SettlePendingTransfersUseCase {
    repository: Arc<dyn TransferRepository + Send + Sync>,
    payouts: Arc<dyn PayoutGateway + Send + Sync>,
}

impl SettlePendingTransfersUseCase {
    pub fn new(
        repository: Arc<dyn TransferRepository + Send + Sync>,
        payouts: Arc<dyn PayoutGateway + Send + Sync>,
    ) -> Self {
        Self {
            repository,
            payouts,
        }
    }

    /// Processes pending transfers one at a time. Failed payouts are recorded
    /// and left for manual follow-up.
    pub async fn run(&self, limit: Option<i64>) -> Result<SettlePendingTransfersResult> {
        let transfers = self
            .repository
            .list_pending(limit.filter(|l| *l > 0))
            .await?;

        let mut result = SettlePendingTransfersResult {
            scanned: transfers.len(),
            ..Default::default()
        };

        for transfer in transfers {
            match self.repository.claim_for_processing(transfer.id).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(transfer_id = %transfer.id, "settlement: already claimed elsewhere");
                    result.skipped_claimed += 1;
                    continue;
                }
                Err(err) => {
                    error!(transfer_id = %transfer.id, db_error = ?err, "settlement: failed to claim transfer");
                    continue;
                }
            }

            match self.payouts.send_payout(&transfer).await {
                Ok(reference) => {
                    if let Err(err) = self
                        .repository
                        .mark_completed(transfer.id, reference.clone())
                        .await
                    {
                        // Money moved; the row stays `processing` until reconciled by hand.
                        error!(
                            transfer_id = %transfer.id,
                            payout_reference = %reference,
                            db_error = ?err,
                            "settlement: payout sent but completion not recorded"
                        );
                        continue;
                    }
                    info!(
                        transfer_id = %transfer.id,
                        merchant_id = %transfer.merchant_id,
                        amount_to_transfer = transfer.amount_to_transfer,
                        payout_reference = %reference,
                        "settlement: transfer completed"
                    );
                    result.completed += 1;
                    if result.completed_ids.len() < MAX_REPORTED_IDS {
                        result.completed_ids.push(transfer.id);
                    }
                }
                Err(payout_err) => {
                    warn!(
                        transfer_id = %transfer.id,
                        merchant_id = %transfer.merchant_id,
                        error = ?payout_err,
                        "settlement: payout failed"
                    );
                    if let Err(err) = self
                        .repository
                        .mark_failed(transfer.id, format!("{payout_err:#}"))
                        .await
                    {
                        error!(transfer_id = %transfer.id, db_error = ?err, "settlement: failed to record payout failure");
                    }
                    result.failed += 1;
                    if result.failed_ids.len() < MAX_REPORTED_IDS {
                        result.failed_ids.push(transfer.id);
                    }
                }
            }
        }

        info!(
            scanned = result.scanned,
            completed = result.completed,
            failed = result.failed,
            skipped_claimed = result.skipped_claimed,
            "settlement: completed"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::Utc;
    use crates::domain::{
        entities::transfers::TransferEntity,
        repositories::{payouts::MockPayoutGateway, transfers::MockTransferRepository},
    };
    use mockall::predicate::eq;

    fn pending_transfer(amount_to_transfer: i64) -> TransferEntity {
        let now = Utc::now();
        TransferEntity {
            id: Uuid::new_v4(),
            payment_id: Uuid::new_v4(),
            merchant_id: Uuid::new_v4(),
            amount_total: amount_to_transfer + 500,
            amount_commission: 500,
            amount_to_transfer,
            destination_account: "barberia.norte.mp".to_string(),
            status: "pending".to_string(),
            error: None,
            payout_reference: None,
            processed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn completes_and_fails_transfers_independently() {
        let ok = pending_transfer(9_500);
        let bad = pending_transfer(4_750);
        let (ok_id, bad_id) = (ok.id, bad.id);

        let mut repo = MockTransferRepository::new();
        repo.expect_list_pending()
            .with(eq(Some(50)))
            .returning(move |_| Ok(vec![ok.clone(), bad.clone()]));
        repo.expect_claim_for_processing().returning(|_| Ok(true));
        repo.expect_mark_completed()
            .with(eq(ok_id), eq("sim-1".to_string()))
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_mark_failed()
            .withf(move |id, error| *id == bad_id && error.contains("destination rejected"))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut payouts = MockPayoutGateway::new();
        payouts.expect_send_payout().returning(move |transfer| {
            if transfer.id == ok_id {
                Ok("sim-1".to_string())
            } else {
                Err(anyhow!("destination rejected"))
            }
        });

        let result = SettlePendingTransfersUseCase::new(Arc::new(repo), Arc::new(payouts))
            .run(Some(50))
            .await
            .unwrap();

        assert_eq!(result.scanned, 2);
        assert_eq!(result.completed_ids, vec![ok_id]);
        assert_eq!(result.failed_ids, vec![bad_id]);
    }

    #[tokio::test]
    async fn skips_transfers_claimed_by_another_run() {
        let transfer = pending_transfer(1_000);

        let mut repo = MockTransferRepository::new();
        repo.expect_list_pending()
            .returning(move |_| Ok(vec![transfer.clone()]));
        repo.expect_claim_for_processing().returning(|_| Ok(false));
        repo.expect_mark_completed().never();
        repo.expect_mark_failed().never();

        let mut payouts = MockPayoutGateway::new();
        payouts.expect_send_payout().never();

        let result = SettlePendingTransfersUseCase::new(Arc::new(repo), Arc::new(payouts))
            .run(None)
            .await
            .unwrap();

        assert_eq!(result.skipped_claimed, 1);
        assert_eq!(result.completed, 0);
    }
}
