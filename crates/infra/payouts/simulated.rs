use anyhow::{Result, bail};
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::domain::{entities::transfers::TransferEntity, repositories::payouts::PayoutGateway};

/// Stand-in for a bank/wallet transfer API. Logs the payout and hands back a
/// synthetic reference; nothing leaves the process.
#[derive(Debug, Default, Clone)]
pub struct SimulatedPayoutGateway;

impl SimulatedPayoutGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PayoutGateway for SimulatedPayoutGateway {
    async fn send_payout(&self, transfer: &TransferEntity) -> Result<String> {
        if transfer.amount_to_transfer < 0 {
            bail!("negative payout amount {}", transfer.amount_to_transfer);
        }

        let reference = format!("sim-{}", Uuid::new_v4().simple());
        info!(
            transfer_id = %transfer.id,
            merchant_id = %transfer.merchant_id,
            destination_account = %transfer.destination_account,
            amount_to_transfer = transfer.amount_to_transfer,
            payout_reference = %reference,
            "payouts: simulated payout sent"
        );

        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn transfer(amount_to_transfer: i64) -> TransferEntity {
        let now = Utc::now();
        TransferEntity {
            id: Uuid::new_v4(),
            payment_id: Uuid::new_v4(),
            merchant_id: Uuid::new_v4(),
            amount_total: amount_to_transfer,
            amount_commission: 0,
            amount_to_transfer,
            destination_account: "0000003100010000000001".to_string(),
            status: "processing".to_string(),
            error: None,
            payout_reference: None,
            processed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn returns_a_synthetic_reference() {
        let reference = SimulatedPayoutGateway::new()
            .send_payout(&transfer(4_750))
            .await
            .unwrap();
        assert!(reference.starts_with("sim-"));
    }

    #[tokio::test]
    async fn refuses_negative_amounts() {
        let result = SimulatedPayoutGateway::new().send_payout(&transfer(-1)).await;
        assert!(result.is_err());
    }
}
