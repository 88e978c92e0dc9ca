use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::transfers;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = transfers)]
pub struct TransferEntity {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub merchant_id: Uuid,
    pub amount_total: i64,
    pub amount_commission: i64,
    pub amount_to_transfer: i64,
    pub destination_account: String,
    pub status: String,
    pub error: Option<String>,
    pub payout_reference: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = transfers)]
pub struct InsertTransferEntity {
    pub payment_id: Uuid,
    pub merchant_id: Uuid,
    pub amount_total: i64,
    pub amount_commission: i64,
    pub amount_to_transfer: i64,
    pub destination_account: String,
    pub status: String,
}
