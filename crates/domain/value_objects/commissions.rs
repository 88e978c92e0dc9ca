use serde::Serialize;

use crate::domain::value_objects::{
    enums::payment_types::CommissionCategory, payment_amounts::percentage_of,
};

pub const DEFAULT_DEPOSIT_COMMISSION_PERCENTAGE: f64 = 3.0;
pub const DEFAULT_FULL_PAYMENT_COMMISSION_PERCENTAGE: f64 = 5.0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CommissionBreakdown {
    pub amount: i64,
    pub commission_amount: i64,
    pub merchant_net_amount: i64,
}

pub fn default_commission_percentage(category: CommissionCategory) -> f64 {
    match category {
        CommissionCategory::Deposit => DEFAULT_DEPOSIT_COMMISSION_PERCENTAGE,
        CommissionCategory::FullPayment => DEFAULT_FULL_PAYMENT_COMMISSION_PERCENTAGE,
    }
}

/// The commission is rounded first and the merchant receives the rest, so
/// both parts always add up to `amount`.
pub fn calculate_commission(amount: i64, commission_percentage: f64) -> CommissionBreakdown {
    let commission_amount = percentage_of(amount, commission_percentage);
    CommissionBreakdown {
        amount,
        commission_amount,
        merchant_net_amount: amount - commission_amount,
    }
}
