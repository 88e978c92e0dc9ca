use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::payments::{InsertPaymentEntity, PaymentEntity},
        repositories::payments::PaymentRepository,
        value_objects::enums::{payment_statuses::PaymentStatus, payment_types::PaymentType},
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::payments},
};

pub struct PaymentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentRepository for PaymentPostgres {
    async fn record_payment(&self, payment: InsertPaymentEntity) -> Result<Option<PaymentEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<PaymentEntity>> {
            let mut conn = db_pool.get()?;

            let created = insert_into(payments::table)
                .values(&payment)
                .on_conflict_do_nothing()
                .returning(PaymentEntity::as_select())
                .get_result::<PaymentEntity>(&mut conn)
                .optional()?;

            Ok(created)
        })
        .await?
    }

    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<PaymentEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<PaymentEntity>> {
            let mut conn = db_pool.get()?;

            let payment = payments::table
                .filter(payments::id.eq(payment_id))
                .select(PaymentEntity::as_select())
                .first::<PaymentEntity>(&mut conn)
                .optional()?;

            Ok(payment)
        })
        .await?
    }

    async fn find_pending_for_booking(
        &self,
        booking_id: Uuid,
        payment_types: Vec<PaymentType>,
    ) -> Result<Option<PaymentEntity>> {
        let db_pool = Arc::clone(&self.db_pool);
        let payment_types: Vec<&'static str> =
            payment_types.iter().map(PaymentType::as_str).collect();

        task::spawn_blocking(move || -> Result<Option<PaymentEntity>> {
            let mut conn = db_pool.get()?;

            let payment = payments::table
                .filter(payments::booking_id.eq(booking_id))
                .filter(payments::payment_type.eq_any(payment_types))
                .filter(payments::status.eq(PaymentStatus::Pending.as_str()))
                .order(payments::created_at.desc())
                .select(PaymentEntity::as_select())
                .first::<PaymentEntity>(&mut conn)
                .optional()?;

            Ok(payment)
        })
        .await?
    }

    async fn attach_preference(
        &self,
        payment_id: Uuid,
        preference_id: String,
        checkout_url: String,
    ) -> Result<()> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        task::spawn_blocking(move || -> Result<()> {
            let mut conn = db_pool.get()?;

            update(payments::table.filter(payments::id.eq(payment_id)))
                .set((
                    payments::gateway_preference_id.eq(Some(preference_id)),
                    payments::checkout_url.eq(Some(checkout_url)),
                    payments::updated_at.eq(now),
                ))
                .execute(&mut conn)?;

            Ok(())
        })
        .await?
    }

    async fn approve_if_pending(
        &self,
        payment_id: Uuid,
        gateway_payment_id: String,
        approved_at: DateTime<Utc>,
    ) -> Result<Option<PaymentEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<PaymentEntity>> {
            let mut conn = db_pool.get()?;

            let approved = update(
                payments::table
                    .filter(payments::id.eq(payment_id))
                    .filter(payments::status.eq(PaymentStatus::Pending.as_str())),
            )
            .set((
                payments::status.eq(PaymentStatus::Approved.as_str()),
                payments::gateway_payment_id.eq(Some(gateway_payment_id)),
                payments::approved_at.eq(Some(approved_at)),
                payments::updated_at.eq(approved_at),
            ))
            .returning(PaymentEntity::as_select())
            .get_result::<PaymentEntity>(&mut conn)
            .optional()?;

            Ok(approved)
        })
        .await?
    }

    async fn close_if_pending(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
        gateway_payment_id: String,
    ) -> Result<bool> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        task::spawn_blocking(move || -> Result<bool> {
            let mut conn = db_pool.get()?;

            let updated = update(
                payments::table
                    .filter(payments::id.eq(payment_id))
                    .filter(payments::status.eq(PaymentStatus::Pending.as_str())),
            )
            .set((
                payments::status.eq(status.as_str()),
                payments::gateway_payment_id.eq(Some(gateway_payment_id)),
                payments::updated_at.eq(now),
            ))
            .execute(&mut conn)?;

            Ok(updated == 1)
        })
        .await?
    }
}
