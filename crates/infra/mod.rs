pub mod db;
pub mod payouts;
