use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::merchants;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = merchants)]
pub struct MerchantEntity {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub deposit_percentage: f64,
    pub instant_discount_percentage: Option<f64>,
    pub deposit_deadline_hours: Option<i32>,
    pub payout_account: Option<String>,
    pub is_premium: bool,
    pub premium_subscription_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MerchantEntity {
    /// Blank payout accounts count as missing.
    pub fn payout_destination(&self) -> Option<&str> {
        self.payout_account
            .as_deref()
            .map(str::trim)
            .filter(|account| !account.is_empty())
    }
}
