use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Deposit,
    Full,
    Remainder,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Deposit => "deposit",
            PaymentType::Full => "full",
            PaymentType::Remainder => "remainder",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "deposit" => Some(PaymentType::Deposit),
            "full" => Some(PaymentType::Full),
            "remainder" => Some(PaymentType::Remainder),
            _ => None,
        }
    }

    /// Types that share one in-flight checkout per booking. Deposit and full
    /// both settle the upfront payment, so only one of them may be pending.
    pub fn checkout_slot(&self) -> Vec<PaymentType> {
        match self {
            PaymentType::Deposit | PaymentType::Full => {
                vec![PaymentType::Deposit, PaymentType::Full]
            }
            PaymentType::Remainder => vec![PaymentType::Remainder],
        }
    }

    pub fn commission_category(&self) -> CommissionCategory {
        match self {
            PaymentType::Deposit => CommissionCategory::Deposit,
            PaymentType::Full | PaymentType::Remainder => CommissionCategory::FullPayment,
        }
    }
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionCategory {
    Deposit,
    FullPayment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_and_full_share_the_upfront_slot() {
        let upfront = vec![PaymentType::Deposit, PaymentType::Full];
        assert_eq!(PaymentType::Deposit.checkout_slot(), upfront);
        assert_eq!(PaymentType::Full.checkout_slot(), upfront);
        assert_eq!(PaymentType::Remainder.checkout_slot(), vec![PaymentType::Remainder]);
    }
}
