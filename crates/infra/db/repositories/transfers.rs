use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::transfers::{InsertTransferEntity, TransferEntity},
        repositories::transfers::TransferRepository,
        value_objects::enums::transfer_statuses::TransferStatus,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::transfers},
};

pub struct TransferPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl TransferPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl TransferRepository for TransferPostgres {
    async fn create_if_absent(&self, transfer: InsertTransferEntity) -> Result<Option<Uuid>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<Uuid>> {
            let mut conn = db_pool.get()?;

            // `transfers.payment_id` is UNIQUE; a redelivered webhook lands here.
            let transfer_id = insert_into(transfers::table)
                .values(&transfer)
                .on_conflict(transfers::payment_id)
                .do_nothing()
                .returning(transfers::id)
                .get_result::<Uuid>(&mut conn)
                .optional()?;

            Ok(transfer_id)
        })
        .await?
    }

    async fn list_pending(&self, limit: Option<i64>) -> Result<Vec<TransferEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<TransferEntity>> {
            let mut conn = db_pool.get()?;

            let mut query = transfers::table
                .select(TransferEntity::as_select())
                .filter(transfers::status.eq(TransferStatus::Pending.to_string()))
                .order(transfers::created_at.asc())
                .into_boxed();

            if let Some(limit) = limit {
                query = query.limit(limit);
            }

            Ok(query.load::<TransferEntity>(&mut conn)?)
        })
        .await?
    }

    async fn claim_for_processing(&self, transfer_id: Uuid) -> Result<bool> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        task::spawn_blocking(move || -> Result<bool> {
            let mut conn = db_pool.get()?;

            let updated = update(
                transfers::table
                    .filter(transfers::id.eq(transfer_id))
                    .filter(transfers::status.eq(TransferStatus::Pending.to_string())),
            )
            .set((
                transfers::status.eq(TransferStatus::Processing.to_string()),
                transfers::updated_at.eq(now),
            ))
            .execute(&mut conn)?;

            Ok(updated == 1)
        })
        .await?
    }

    async fn mark_completed(&self, transfer_id: Uuid, payout_reference: String) -> Result<()> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        task::spawn_blocking(move || -> Result<()> {
            let mut conn = db_pool.get()?;

            update(transfers::table.filter(transfers::id.eq(transfer_id)))
                .set((
                    transfers::status.eq(TransferStatus::Completed.to_string()),
                    transfers::payout_reference.eq(Some(payout_reference)),
                    transfers::error.eq(None::<String>),
                    transfers::processed_at.eq(Some(now)),
                    transfers::updated_at.eq(now),
                ))
                .execute(&mut conn)?;

            Ok(())
        })
        .await?
    }

    async fn mark_failed(&self, transfer_id: Uuid, error: String) -> Result<()> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        task::spawn_blocking(move || -> Result<()> {
            let mut conn = db_pool.get()?;

            update(transfers::table.filter(transfers::id.eq(transfer_id)))
                .set((
                    transfers::status.eq(TransferStatus::Failed.to_string()),
                    transfers::error.eq(Some(error)),
                    transfers::processed_at.eq(Some(now)),
                    transfers::updated_at.eq(now),
                ))
                .execute(&mut conn)?;

            Ok(())
        })
        .await?
    }
}
