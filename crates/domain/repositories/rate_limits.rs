use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

#[automock]
#[async_trait]
pub trait RateLimitRepository {
    /// Atomically bumps the counter for `(key, window_start)` and returns the
    /// new count.
    async fn increment(&self, key: &str, window_start: DateTime<Utc>) -> Result<i32>;

    async fn purge_windows_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}
