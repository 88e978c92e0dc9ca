use serde::Serialize;
use thiserror::Error;

pub const MIN_DEPOSIT_PERCENTAGE: f64 = 10.0;
pub const MAX_DEPOSIT_PERCENTAGE: f64 = 100.0;
pub const MIN_INSTANT_DISCOUNT_PERCENTAGE: f64 = 0.0;
pub const MAX_INSTANT_DISCOUNT_PERCENTAGE: f64 = 50.0;

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("El precio del servicio no puede ser negativo")]
    NegativePrice,
    #[error("El porcentaje de seña debe estar entre 10% y 100%")]
    DepositPercentageOutOfRange,
    #[error("El descuento por pago inmediato debe estar entre 0% y 50%")]
    DiscountPercentageOutOfRange,
}

/// Amounts derived from a service price, in whole currency units.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PaymentAmounts {
    pub service_price: i64,
    pub deposit_amount: i64,
    pub remaining_amount: i64,
    pub discount_amount: i64,
    pub discounted_total: i64,
}

/// `round(amount * percentage / 100)` to the nearest currency unit.
pub fn percentage_of(amount: i64, percentage: f64) -> i64 {
    (amount as f64 * percentage / 100.0).round() as i64
}

pub fn calculate_payment_amounts(
    service_price: i64,
    deposit_percentage: f64,
    instant_discount_percentage: Option<f64>,
) -> Result<PaymentAmounts, PricingError> {
    if service_price < 0 {
        return Err(PricingError::NegativePrice);
    }
    if !(MIN_DEPOSIT_PERCENTAGE..=MAX_DEPOSIT_PERCENTAGE).contains(&deposit_percentage) {
        return Err(PricingError::DepositPercentageOutOfRange);
    }

    let discount_percentage = instant_discount_percentage.unwrap_or(0.0);
    if !(MIN_INSTANT_DISCOUNT_PERCENTAGE..=MAX_INSTANT_DISCOUNT_PERCENTAGE)
        .contains(&discount_percentage)
    {
        return Err(PricingError::DiscountPercentageOutOfRange);
    }

    let deposit_amount = percentage_of(service_price, deposit_percentage);
    let discount_amount = percentage_of(service_price, discount_percentage);

    Ok(PaymentAmounts {
        service_price,
        deposit_amount,
        remaining_amount: service_price - deposit_amount,
        discount_amount,
        discounted_total: service_price - discount_amount,
    })
}
