use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::transfers::TransferEntity;

/// Outbound money movement to a merchant's payout account.
#[automock]
#[async_trait]
pub trait PayoutGateway {
    /// Returns the provider's reference for the executed payout.
    async fn send_payout(&self, transfer: &TransferEntity) -> Result<String>;
}
