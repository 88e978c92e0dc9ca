pub mod bookings;
pub mod merchants;
pub mod payments;
pub mod platform_config;
pub mod rate_limits;
pub mod transfers;
