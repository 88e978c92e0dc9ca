use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::bookings::BookingEntity;
use crate::domain::value_objects::{
    deposit_deadline::seconds_until_deadline, enums::booking_statuses::BookingStatus,
};

#[derive(Debug, Clone, Deserialize)]
pub struct ReserveBookingRequest {
    pub merchant_id: Uuid,
    pub service_id: Uuid,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub instant_payment: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingDto {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub client_id: Uuid,
    pub service_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub deposit_deadline: Option<DateTime<Utc>>,
}

impl From<BookingEntity> for BookingDto {
    fn from(value: BookingEntity) -> Self {
        Self {
            status: value.booking_status(),
            id: value.id,
            merchant_id: value.merchant_id,
            client_id: value.client_id,
            service_id: value.service_id,
            starts_at: value.starts_at,
            ends_at: value.ends_at,
            deposit_deadline: value.deposit_deadline,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingPaymentSummaryDto {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub service_price: i64,
    pub deposit_amount: i64,
    pub remaining_amount: i64,
    pub discount_amount: i64,
    pub full_payment_amount: i64,
    pub instant_discount_applied: bool,
    pub deposit_paid: bool,
    pub full_payment_paid: bool,
    pub deposit_deadline: Option<DateTime<Utc>>,
    pub seconds_until_deadline: Option<i64>,
}

impl BookingPaymentSummaryDto {
    pub fn from_booking(booking: &BookingEntity, now: DateTime<Utc>) -> Self {
        let status = booking.booking_status();
        let seconds_until_deadline = if status == BookingStatus::PendingDeposit {
            seconds_until_deadline(booking.deposit_deadline, now)
        } else {
            None
        };

        Self {
            booking_id: booking.id,
            status,
            service_price: booking.service_price,
            deposit_amount: booking.deposit_amount,
            remaining_amount: booking.remaining_amount,
            discount_amount: booking.discount_amount,
            full_payment_amount: booking.full_payment_amount(),
            instant_discount_applied: booking.instant_discount_applied,
            deposit_paid: booking.deposit_paid,
            full_payment_paid: booking.full_payment_paid,
            deposit_deadline: booking.deposit_deadline,
            seconds_until_deadline,
        }
    }
}
