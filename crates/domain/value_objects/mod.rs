pub mod bookings;
pub mod commissions;
pub mod deposit_deadline;
pub mod enums;
pub mod payment_amounts;
pub mod payments;
pub mod platform_config;
