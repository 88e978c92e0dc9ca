use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::payment_types::PaymentType;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub payment_type: PaymentType,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreatePaymentResponse {
    pub payment_id: Uuid,
    pub amount: i64,
    pub checkout_url: String,
    pub reused: bool,
}

/// A single-item checkout the gateway should collect for one payment.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutPreferenceRequest {
    pub payment_id: Uuid,
    pub title: String,
    pub amount: i64,
    pub payer_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutPreference {
    pub preference_id: String,
    pub checkout_url: String,
}
