use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::platform_config::{
    PlatformConfigEntity, UpsertPlatformConfigEntity,
};

#[automock]
#[async_trait]
pub trait PlatformConfigRepository {
    async fn find_value(&self, key: &str) -> Result<Option<String>>;

    async fn list_entries(&self) -> Result<Vec<PlatformConfigEntity>>;

    async fn upsert_entry(&self, entry: UpsertPlatformConfigEntity)
    -> Result<PlatformConfigEntity>;
}
