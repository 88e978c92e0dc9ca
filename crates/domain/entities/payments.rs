use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::value_objects::enums::{
    payment_statuses::PaymentStatus, payment_types::PaymentType,
};
use crate::infra::db::postgres::schema::payments;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payments)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: i64,
    pub payment_type: String,
    pub status: String,
    pub platform_commission_amount: i64,
    pub gateway_preference_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub checkout_url: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentEntity {
    pub fn payment_type(&self) -> Option<PaymentType> {
        PaymentType::from_str(&self.payment_type)
    }

    pub fn payment_status(&self) -> Option<PaymentStatus> {
        PaymentStatus::from_str(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payments)]
pub struct InsertPaymentEntity {
    pub booking_id: Uuid,
    pub amount: i64,
    pub payment_type: String,
    pub status: String,
    pub platform_commission_amount: i64,
}
