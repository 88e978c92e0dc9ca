pub mod booking_statuses;
pub mod payment_statuses;
pub mod payment_types;
pub mod transfer_statuses;
