use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{
    commissions::{DEFAULT_DEPOSIT_COMMISSION_PERCENTAGE, DEFAULT_FULL_PAYMENT_COMMISSION_PERCENTAGE},
    enums::payment_types::CommissionCategory,
};

pub const DEFAULT_DEPOSIT_DEADLINE_HOURS: i64 = 24;
/// One year.
pub const MAX_DEPOSIT_DEADLINE_HOURS: i64 = 8_760;

/// Keys of the `platform_config` table the application understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformConfigKey {
    CommissionDepositPercentage,
    CommissionFullPaymentPercentage,
    DepositDeadlineHoursDefault,
}

impl PlatformConfigKey {
    pub const ALL: [PlatformConfigKey; 3] = [
        PlatformConfigKey::CommissionDepositPercentage,
        PlatformConfigKey::CommissionFullPaymentPercentage,
        PlatformConfigKey::DepositDeadlineHoursDefault,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformConfigKey::CommissionDepositPercentage => "commission_deposit_percentage",
            PlatformConfigKey::CommissionFullPaymentPercentage => {
                "commission_full_payment_percentage"
            }
            PlatformConfigKey::DepositDeadlineHoursDefault => "deposit_deadline_hours_default",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }

    pub fn for_commission(category: CommissionCategory) -> Self {
        match category {
            CommissionCategory::Deposit => PlatformConfigKey::CommissionDepositPercentage,
            CommissionCategory::FullPayment => PlatformConfigKey::CommissionFullPaymentPercentage,
        }
    }

    pub fn default_value(&self) -> String {
        match self {
            PlatformConfigKey::CommissionDepositPercentage => {
                DEFAULT_DEPOSIT_COMMISSION_PERCENTAGE.to_string()
            }
            PlatformConfigKey::CommissionFullPaymentPercentage => {
                DEFAULT_FULL_PAYMENT_COMMISSION_PERCENTAGE.to_string()
            }
            PlatformConfigKey::DepositDeadlineHoursDefault => {
                DEFAULT_DEPOSIT_DEADLINE_HOURS.to_string()
            }
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PlatformConfigKey::CommissionDepositPercentage => {
                "Platform commission on deposit payments"
            }
            PlatformConfigKey::CommissionFullPaymentPercentage => {
                "Platform commission on full and remainder payments"
            }
            PlatformConfigKey::DepositDeadlineHoursDefault => {
                "Hours a client has to pay the deposit when the merchant sets none"
            }
        }
    }

    /// Returns the normalized value, or the user-facing reason it was rejected.
    pub fn validate(&self, raw: &str) -> Result<String, &'static str> {
        let raw = raw.trim();
        match self {
            PlatformConfigKey::CommissionDepositPercentage
            | PlatformConfigKey::CommissionFullPaymentPercentage => match raw.parse::<f64>() {
                Ok(value) if value.is_finite() && (0.0..=100.0).contains(&value) => {
                    Ok(value.to_string())
                }
                _ => Err("La comisión debe ser un número entre 0 y 100"),
            },
            PlatformConfigKey::DepositDeadlineHoursDefault => match raw.parse::<i64>() {
                Ok(value) if (1..=MAX_DEPOSIT_DEADLINE_HOURS).contains(&value) => {
                    Ok(value.to_string())
                }
                _ => Err("El plazo de seña debe ser un número entero de horas entre 1 y 8760"),
            },
        }
    }
}

/// Parses a stored commission percentage, rejecting anything outside 0–100.
pub fn parse_percentage(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && (0.0..=100.0).contains(value))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformConfigEntryDto {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub updated_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePlatformConfigRequest {
    pub value: String,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for key in PlatformConfigKey::ALL {
            assert_eq!(PlatformConfigKey::from_str(key.as_str()), Some(key));
        }
        assert_eq!(PlatformConfigKey::from_str("unknown"), None);
    }

    #[test]
    fn commission_values_are_bounded() {
        let key = PlatformConfigKey::CommissionDepositPercentage;
        assert_eq!(key.validate(" 4.5 "), Ok("4.5".to_string()));
        assert_eq!(key.validate("0"), Ok("0".to_string()));
        assert!(key.validate("101").is_err());
        assert!(key.validate("-1").is_err());
        assert!(key.validate("NaN").is_err());
        assert!(key.validate("abc").is_err());
    }

    #[test]
    fn deadline_hours_must_be_bounded_integer() {
        let key = PlatformConfigKey::DepositDeadlineHoursDefault;
        assert_eq!(key.validate("48"), Ok("48".to_string()));
        assert!(key.validate("0").is_err());
        assert!(key.validate("1.5").is_err());
        assert_eq!(key.validate("8760"), Ok("8760".to_string()));
        assert!(key.validate("8761").is_err());
        assert!(key.validate("9223372036854775807").is_err());
    }

    #[test]
    fn parse_percentage_rejects_garbage() {
        assert_eq!(parse_percentage("3"), Some(3.0));
        assert_eq!(parse_percentage("150"), None);
        assert_eq!(parse_percentage(""), None);
    }
}
