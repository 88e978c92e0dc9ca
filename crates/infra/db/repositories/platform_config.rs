use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use tokio::task;

use crate::{
    domain::{
        entities::platform_config::{PlatformConfigEntity, UpsertPlatformConfigEntity},
        repositories::platform_config::PlatformConfigRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::platform_config},
};

pub struct PlatformConfigPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlatformConfigPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PlatformConfigRepository for PlatformConfigPostgres {
    async fn find_value(&self, key: &str) -> Result<Option<String>> {
        let db_pool = Arc::clone(&self.db_pool);
        let key = key.to_string();

        task::spawn_blocking(move || -> Result<Option<String>> {
            let mut conn = db_pool.get()?;

            let value = platform_config::table
                .filter(platform_config::key.eq(key))
                .select(platform_config::value)
                .first::<String>(&mut conn)
                .optional()?;

            Ok(value)
        })
        .await?
    }

    async fn list_entries(&self) -> Result<Vec<PlatformConfigEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<PlatformConfigEntity>> {
            let mut conn = db_pool.get()?;

            let entries = platform_config::table
                .select(PlatformConfigEntity::as_select())
                .order(platform_config::key.asc())
                .load::<PlatformConfigEntity>(&mut conn)?;

            Ok(entries)
        })
        .await?
    }

    async fn upsert_entry(
        &self,
        entry: UpsertPlatformConfigEntity,
    ) -> Result<PlatformConfigEntity> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<PlatformConfigEntity> {
            let mut conn = db_pool.get()?;

            // A `None` description leaves the stored one untouched.
            let stored = insert_into(platform_config::table)
                .values(&entry)
                .on_conflict(platform_config::key)
                .do_update()
                .set(&entry)
                .returning(PlatformConfigEntity::as_select())
                .get_result::<PlatformConfigEntity>(&mut conn)?;

            Ok(stored)
        })
        .await?
    }
}
