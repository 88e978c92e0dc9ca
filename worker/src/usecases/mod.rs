pub mod expire_unpaid_deposits;
pub mod settle_pending_transfers;
