use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, delete, insert_into, prelude::*};
use std::sync::Arc;
use tokio::task;

use crate::{
    domain::repositories::rate_limits::RateLimitRepository,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::rate_limit_counters},
};

pub struct RateLimitPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl RateLimitPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl RateLimitRepository for RateLimitPostgres {
    async fn increment(&self, key: &str, window_start: DateTime<Utc>) -> Result<i32> {
        let db_pool = Arc::clone(&self.db_pool);
        let key = key.to_string();

        task::spawn_blocking(move || -> Result<i32> {
            let mut conn = db_pool.get()?;

            let count = insert_into(rate_limit_counters::table)
                .values((
                    rate_limit_counters::key.eq(key),
                    rate_limit_counters::window_start.eq(window_start),
                    rate_limit_counters::count.eq(1),
                ))
                .on_conflict((rate_limit_counters::key, rate_limit_counters::window_start))
                .do_update()
                .set(rate_limit_counters::count.eq(rate_limit_counters::count + 1))
                .returning(rate_limit_counters::count)
                .get_result::<i32>(&mut conn)?;

            Ok(count)
        })
        .await?
    }

    async fn purge_windows_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<usize> {
            let mut conn = db_pool.get()?;

            let deleted = delete(
                rate_limit_counters::table.filter(rate_limit_counters::window_start.lt(cutoff)),
            )
            .execute(&mut conn)?;

            Ok(deleted)
        })
        .await?
    }
}
