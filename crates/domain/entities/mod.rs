pub mod bookings;
pub mod merchants;
pub mod payments;
pub mod platform_config;
pub mod services;
pub mod transfers;
