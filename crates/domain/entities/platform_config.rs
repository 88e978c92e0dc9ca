use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::platform_config;

#[derive(Debug, Clone, PartialEq, Selectable, Queryable)]
#[diesel(table_name = platform_config)]
pub struct PlatformConfigEntity {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = platform_config)]
pub struct UpsertPlatformConfigEntity {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}
