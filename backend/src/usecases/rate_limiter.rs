use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use crates::domain::repositories::rate_limits::RateLimitRepository;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: i32 },
    Limited { retry_after_seconds: i64 },
}

/// Fixed-window counter shared by every instance through the database.
pub struct RateLimiter<R>
where
    R: RateLimitRepository + Send + Sync + 'static,
{
    repository: Arc<R>,
    max_requests: i32,
    window_seconds: i64,
}

impl<R> RateLimiter<R>
where
    R: RateLimitRepository + Send + Sync + 'static,
{
    pub fn new(repository: Arc<R>, max_requests: i32, window_seconds: i64) -> Self {
        Self {
            repository,
            max_requests: max_requests.max(1),
            window_seconds: window_seconds.max(1),
        }
    }

    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let start = now.timestamp() - now.timestamp().rem_euclid(self.window_seconds);
        Utc.timestamp_opt(start, 0).single().unwrap_or(now)
    }

    /// Counts one hit for `key`. Storage failures let the request through.
    pub async fn check(&self, key: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let window_start = self.window_start(now);

        let count = match self.repository.increment(key, window_start).await {
            Ok(count) => count,
            Err(err) => {
                warn!(key, db_error = ?err, "rate_limit: counter unavailable; allowing request");
                return RateLimitDecision::Allowed {
                    remaining: self.max_requests,
                };
            }
        };

        if count > self.max_requests {
            let retry_after_seconds =
                (window_start.timestamp() + self.window_seconds - now.timestamp()).max(1);
            debug!(key, count, retry_after_seconds, "rate_limit: limited");
            RateLimitDecision::Limited {
                retry_after_seconds,
            }
        } else {
            RateLimitDecision::Allowed {
                remaining: self.max_requests - count,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use crates::domain::repositories::rate_limits::MockRateLimitRepository;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).single().unwrap()
    }

    #[test]
    fn windows_are_aligned() {
        let limiter = RateLimiter::new(Arc::new(MockRateLimitRepository::new()), 30, 60);
        assert_eq!(limiter.window_start(at(1_000_059)), at(1_000_020));
        assert_eq!(limiter.window_start(at(1_000_080)), at(1_000_080));
    }

    #[tokio::test]
    async fn allows_until_limit_then_limits() {
        let mut repo = MockRateLimitRepository::new();
        repo.expect_increment()
            .withf(|key, window| key == "payments:10.0.0.1" && *window == at(1_000_020))
            .times(2)
            .returning({
                let mut count = 1;
                move |_, _| {
                    count += 1;
                    Ok(count)
                }
            });

        let limiter = RateLimiter::new(Arc::new(repo), 2, 60);
        assert_eq!(
            limiter.check("payments:10.0.0.1", at(1_000_050)).await,
            RateLimitDecision::Allowed { remaining: 0 }
        );
        assert_eq!(
            limiter.check("payments:10.0.0.1", at(1_000_050)).await,
            RateLimitDecision::Limited {
                retry_after_seconds: 30
            }
        );
    }

    #[tokio::test]
    async fn storage_errors_fail_open() {
        let mut repo = MockRateLimitRepository::new();
        repo.expect_increment()
            .returning(|_, _| Err(anyhow!("pool timed out")));

        let limiter = RateLimiter::new(Arc::new(repo), 5, 60);
        assert_eq!(
            limiter.check("webhooks:10.0.0.2", at(1_000_000)).await,
            RateLimitDecision::Allowed { remaining: 5 }
        );
    }
}
