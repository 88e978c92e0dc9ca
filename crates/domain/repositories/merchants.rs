use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::{merchants::MerchantEntity, services::ServiceEntity};

#[automock]
#[async_trait]
pub trait MerchantRepository {
    async fn find_by_id(&self, merchant_id: Uuid) -> Result<Option<MerchantEntity>>;

    async fn find_active_service(&self, service_id: Uuid) -> Result<Option<ServiceEntity>>;

    async fn set_premium_status(
        &self,
        merchant_id: Uuid,
        is_premium: bool,
        subscription_ref: Option<String>,
    ) -> Result<bool>;
}
