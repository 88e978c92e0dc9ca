pub mod bookings;
pub mod payment_gateway;
pub mod payment_webhook;
pub mod payments;
pub mod platform_config;
pub mod rate_limiter;
pub mod subscription_webhook;
