pub mod bookings;
pub mod platform_config;
pub mod webhooks;
