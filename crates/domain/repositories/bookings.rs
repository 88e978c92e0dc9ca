use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::bookings::{BookingEntity, InsertBookingEntity};
use crate::domain::value_objects::enums::booking_statuses::BookingStatus;

#[automock]
#[async_trait]
pub trait BookingRepository {
    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>>;

    async fn create_booking(&self, booking: InsertBookingEntity) -> Result<BookingEntity>;

    /// Moves the booking to `to` only while it is still in `from`.
    /// Returns `false` when another writer changed it first.
    async fn update_status_if(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool>;

    /// Records an approved deposit (or full payment when `full_payment` is set)
    /// and confirms the booking. Only bookings still awaiting their deposit, or
    /// expired while the payment was in flight, are updated.
    async fn confirm_with_payment(
        &self,
        booking_id: Uuid,
        full_payment: bool,
    ) -> Result<Option<BookingEntity>>;

    async fn mark_full_payment_paid(&self, booking_id: Uuid) -> Result<bool>;

    async fn list_overdue_pending_deposits(
        &self,
        now: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<BookingEntity>>;

    /// Expires the given bookings, re-checking the overdue conditions in the
    /// same statement. Returns the ids actually expired.
    async fn expire_pending_deposits(
        &self,
        booking_ids: Vec<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>>;
}
