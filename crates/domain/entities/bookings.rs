use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::value_objects::enums::booking_statuses::BookingStatus;
use crate::infra::db::postgres::schema::bookings;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = bookings)]
pub struct BookingEntity {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub client_id: Uuid,
    pub service_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: String,
    pub service_price: i64,
    pub deposit_amount: i64,
    pub remaining_amount: i64,
    pub discount_amount: i64,
    pub deposit_paid: bool,
    pub full_payment_paid: bool,
    pub deposit_deadline: Option<DateTime<Utc>>,
    pub instant_discount_applied: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingEntity {
    /// Unknown stored values are treated as cancelled so they never look payable.
    pub fn booking_status(&self) -> BookingStatus {
        BookingStatus::from_str(&self.status).unwrap_or(BookingStatus::Cancelled)
    }

    /// Total the client pays when settling the whole booking in one payment.
    pub fn full_payment_amount(&self) -> i64 {
        if self.instant_discount_applied {
            self.service_price - self.discount_amount
        } else {
            self.service_price
        }
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = bookings)]
pub struct InsertBookingEntity {
    pub merchant_id: Uuid,
    pub client_id: Uuid,
    pub service_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: String,
    pub service_price: i64,
    pub deposit_amount: i64,
    pub remaining_amount: i64,
    pub discount_amount: i64,
    pub deposit_paid: bool,
    pub full_payment_paid: bool,
    pub deposit_deadline: Option<DateTime<Utc>>,
    pub instant_discount_applied: bool,
}
