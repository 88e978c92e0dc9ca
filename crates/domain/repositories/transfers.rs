use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::transfers::{InsertTransferEntity, TransferEntity};

#[automock]
#[async_trait]
pub trait TransferRepository {
    /// Inserts the transfer unless one already exists for the payment.
    /// Returns the new id, or `None` on conflict.
    async fn create_if_absent(&self, transfer: InsertTransferEntity) -> Result<Option<Uuid>>;

    async fn list_pending(&self, limit: Option<i64>) -> Result<Vec<TransferEntity>>;

    /// `pending -> processing`. Returns `false` when someone else claimed it.
    async fn claim_for_processing(&self, transfer_id: Uuid) -> Result<bool>;

    async fn mark_completed(&self, transfer_id: Uuid, payout_reference: String) -> Result<()>;

    async fn mark_failed(&self, transfer_id: Uuid, error: String) -> Result<()>;
}
