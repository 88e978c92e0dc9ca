use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{merchants::MerchantEntity, services::ServiceEntity},
        repositories::merchants::MerchantRepository,
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{merchants, services},
    },
};

pub struct MerchantPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MerchantPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MerchantRepository for MerchantPostgres {
    async fn find_by_id(&self, merchant_id: Uuid) -> Result<Option<MerchantEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<MerchantEntity>> {
            let mut conn = db_pool.get()?;

            let merchant = merchants::table
                .filter(merchants::id.eq(merchant_id))
                .select(MerchantEntity::as_select())
                .first::<MerchantEntity>(&mut conn)
                .optional()?;

            Ok(merchant)
        })
        .await?
    }

    async fn find_active_service(&self, service_id: Uuid) -> Result<Option<ServiceEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<ServiceEntity>> {
            let mut conn = db_pool.get()?;

            let service = services::table
                .filter(services::id.eq(service_id))
                .filter(services::is_active.eq(true))
                .select(ServiceEntity::as_select())
                .first::<ServiceEntity>(&mut conn)
                .optional()?;

            Ok(service)
        })
        .await?
    }

    async fn set_premium_status(
        &self,
        merchant_id: Uuid,
        is_premium: bool,
        subscription_ref: Option<String>,
    ) -> Result<bool> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        task::spawn_blocking(move || -> Result<bool> {
            let mut conn = db_pool.get()?;

            let updated = update(merchants::table.filter(merchants::id.eq(merchant_id)))
                .set((
                    merchants::is_premium.eq(is_premium),
                    merchants::premium_subscription_ref.eq(subscription_ref),
                    merchants::updated_at.eq(now),
                ))
                .execute(&mut conn)?;

            Ok(updated == 1)
        })
        .await?
    }
}
