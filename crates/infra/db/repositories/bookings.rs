use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::bookings::{BookingEntity, InsertBookingEntity},
        repositories::bookings::BookingRepository,
        value_objects::enums::booking_statuses::BookingStatus,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::bookings},
};

pub struct BookingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BookingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BookingRepository for BookingPostgres {
    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>> {
        // Diesel is synchronous; keep it off the async workers.
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<BookingEntity>> {
            let mut conn = db_pool.get()?;

            let booking = bookings::table
                .filter(bookings::id.eq(booking_id))
                .select(BookingEntity::as_select())
                .first::<BookingEntity>(&mut conn)
                .optional()?;

            Ok(booking)
        })
        .await?
    }

    async fn create_booking(&self, booking: InsertBookingEntity) -> Result<BookingEntity> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<BookingEntity> {
            let mut conn = db_pool.get()?;

            let created = insert_into(bookings::table)
                .values(&booking)
                .returning(BookingEntity::as_select())
                .get_result::<BookingEntity>(&mut conn)?;

            Ok(created)
        })
        .await?
    }

    async fn update_status_if(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        task::spawn_blocking(move || -> Result<bool> {
            let mut conn = db_pool.get()?;

            let updated = update(
                bookings::table
                    .filter(bookings::id.eq(booking_id))
                    .filter(bookings::status.eq(from.as_str())),
            )
            .set((
                bookings::status.eq(to.as_str()),
                bookings::updated_at.eq(now),
            ))
            .execute(&mut conn)?;

            Ok(updated == 1)
        })
        .await?
    }

    async fn confirm_with_payment(
        &self,
        booking_id: Uuid,
        full_payment: bool,
    ) -> Result<Option<BookingEntity>> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        task::spawn_blocking(move || -> Result<Option<BookingEntity>> {
            let mut conn = db_pool.get()?;

            let confirmable = vec![
                BookingStatus::PendingDeposit.as_str(),
                BookingStatus::Expired.as_str(),
            ];

            let updated = update(
                bookings::table
                    .filter(bookings::id.eq(booking_id))
                    .filter(bookings::status.eq_any(confirmable)),
            )
            .set((
                bookings::status.eq(BookingStatus::Confirmed.as_str()),
                bookings::deposit_paid.eq(true),
                bookings::full_payment_paid.eq(full_payment),
                bookings::updated_at.eq(now),
            ))
            .returning(BookingEntity::as_select())
            .get_result::<BookingEntity>(&mut conn)
            .optional()?;

            Ok(updated)
        })
        .await?
    }

    async fn mark_full_payment_paid(&self, booking_id: Uuid) -> Result<bool> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        task::spawn_blocking(move || -> Result<bool> {
            let mut conn = db_pool.get()?;

            let updated = update(
                bookings::table
                    .filter(bookings::id.eq(booking_id))
                    .filter(bookings::deposit_paid.eq(true))
                    .filter(bookings::full_payment_paid.eq(false)),
            )
            .set((
                bookings::full_payment_paid.eq(true),
                bookings::updated_at.eq(now),
            ))
            .execute(&mut conn)?;

            Ok(updated == 1)
        })
        .await?
    }

    async fn list_overdue_pending_deposits(
        &self,
        now: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<BookingEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<BookingEntity>> {
            let mut conn = db_pool.get()?;

            let mut query = bookings::table
                .select(BookingEntity::as_select())
                .filter(bookings::status.eq(BookingStatus::PendingDeposit.as_str()))
                .filter(bookings::deposit_paid.eq(false))
                .filter(bookings::deposit_deadline.lt(now))
                .order(bookings::deposit_deadline.asc())
                .into_boxed();

            if let Some(limit) = limit {
                query = query.limit(limit);
            }

            Ok(query.load::<BookingEntity>(&mut conn)?)
        })
        .await?
    }

    async fn expire_pending_deposits(
        &self,
        booking_ids: Vec<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>> {
        if booking_ids.is_empty() {
            return Ok(Vec::new());
        }

        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<Uuid>> {
            let mut conn = db_pool.get()?;

            // Same guards as the listing query: a webhook confirming the deposit
            // in between wins.
            let expired = update(
                bookings::table
                    .filter(bookings::id.eq_any(booking_ids))
                    .filter(bookings::status.eq(BookingStatus::PendingDeposit.as_str()))
                    .filter(bookings::deposit_paid.eq(false))
                    .filter(bookings::deposit_deadline.lt(now)),
            )
            .set((
                bookings::status.eq(BookingStatus::Expired.as_str()),
                bookings::updated_at.eq(now),
            ))
            .returning(bookings::id)
            .get_results::<Uuid>(&mut conn)?;

            Ok(expired)
        })
        .await?
    }
}
