use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    PendingDeposit,
    Confirmed,
    Expired,
    Cancelled,
    Completed,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingDeposit => "pending_deposit",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Expired => "expired",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::NoShow => "no_show",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending_deposit" => Some(BookingStatus::PendingDeposit),
            "confirmed" => Some(BookingStatus::Confirmed),
            "expired" => Some(BookingStatus::Expired),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            "no_show" => Some(BookingStatus::NoShow),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Expired
                | BookingStatus::Cancelled
                | BookingStatus::Completed
                | BookingStatus::NoShow
        )
    }

    /// Outcomes of an appointment only the merchant can record.
    pub fn is_merchant_outcome(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::NoShow)
    }

    /// Transitions a merchant or client may request directly.
    ///
    /// `PendingDeposit -> Confirmed` is reserved for the payment webhook and
    /// `PendingDeposit -> Expired` for the deposit-expiry sweep, so neither is
    /// accepted here.
    pub fn can_be_changed_manually_to(&self, next: BookingStatus) -> bool {
        match (self, next) {
            (BookingStatus::PendingDeposit, BookingStatus::Cancelled) => true,
            (
                BookingStatus::Confirmed,
                BookingStatus::Cancelled | BookingStatus::Completed | BookingStatus::NoShow,
            ) => true,
            _ => false,
        }
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_deposit_can_only_be_cancelled_manually() {
        let pending = BookingStatus::PendingDeposit;
        assert!(pending.can_be_changed_manually_to(BookingStatus::Cancelled));
        assert!(!pending.can_be_changed_manually_to(BookingStatus::Confirmed));
        assert!(!pending.can_be_changed_manually_to(BookingStatus::Expired));
        assert!(!pending.can_be_changed_manually_to(BookingStatus::Completed));
    }

    #[test]
    fn terminal_statuses_accept_no_transition() {
        for status in [
            BookingStatus::Expired,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
            BookingStatus::NoShow,
        ] {
            assert!(status.is_terminal());
            for next in [
                BookingStatus::PendingDeposit,
                BookingStatus::Confirmed,
                BookingStatus::Cancelled,
                BookingStatus::Completed,
            ] {
                assert!(!status.can_be_changed_manually_to(next), "{status} -> {next}");
            }
        }
    }

    #[test]
    fn round_trips_through_storage_strings() {
        for status in [
            BookingStatus::PendingDeposit,
            BookingStatus::Confirmed,
            BookingStatus::Expired,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
            BookingStatus::NoShow,
        ] {
            assert_eq!(BookingStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::from_str("paid"), None);
    }
}
