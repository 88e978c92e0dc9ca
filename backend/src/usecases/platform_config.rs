use std::{collections::HashMap, sync::Arc};

use axum::http::StatusCode;
use chrono::Utc;
use crates::domain::{
    entities::platform_config::{PlatformConfigEntity, UpsertPlatformConfigEntity},
    repositories::platform_config::PlatformConfigRepository,
    value_objects::{
        commissions::default_commission_percentage,
        enums::payment_types::CommissionCategory,
        platform_config::{
            DEFAULT_DEPOSIT_DEADLINE_HOURS, MAX_DEPOSIT_DEADLINE_HOURS, PlatformConfigEntryDto,
            PlatformConfigKey, UpdatePlatformConfigRequest, parse_percentage,
        },
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PlatformConfigError {
    #[error("Se requiere rol de administrador")]
    Forbidden,
    #[error("Clave de configuración desconocida: {0}")]
    UnknownKey(String),
    #[error("{0}")]
    InvalidValue(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PlatformConfigError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PlatformConfigError::Forbidden => StatusCode::FORBIDDEN,
            PlatformConfigError::UnknownKey(_) => StatusCode::NOT_FOUND,
            PlatformConfigError::InvalidValue(_) => StatusCode::BAD_REQUEST,
            PlatformConfigError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PlatformConfigError>;

/// Read-through access to platform settings. Lookups never fail: a missing,
/// unreadable or out-of-range value falls back to the built-in default.
pub struct PlatformSettings<C>
where
    C: PlatformConfigRepository + Send + Sync + 'static,
{
    config_repo: Arc<C>,
}

impl<C> PlatformSettings<C>
where
    C: PlatformConfigRepository + Send + Sync + 'static,
{
    pub fn new(config_repo: Arc<C>) -> Self {
        Self { config_repo }
    }

    pub async fn commission_percentage(&self, category: CommissionCategory) -> f64 {
        let key = PlatformConfigKey::for_commission(category);
        let fallback = default_commission_percentage(category);

        match self.raw_value(key).await {
            Some(raw) => parse_percentage(&raw).unwrap_or_else(|| {
                warn!(
                    key = key.as_str(),
                    value = %raw,
                    fallback,
                    "platform_config: commission value out of range; using default"
                );
                fallback
            }),
            None => fallback,
        }
    }

    pub async fn deposit_deadline_hours(&self) -> i64 {
        let key = PlatformConfigKey::DepositDeadlineHoursDefault;

        match self.raw_value(key).await {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(hours) if (1..=MAX_DEPOSIT_DEADLINE_HOURS).contains(&hours) => hours,
                _ => {
                    warn!(
                        key = key.as_str(),
                        value = %raw,
                        fallback = DEFAULT_DEPOSIT_DEADLINE_HOURS,
                        "platform_config: invalid deadline hours; using default"
                    );
                    DEFAULT_DEPOSIT_DEADLINE_HOURS
                }
            },
            None => DEFAULT_DEPOSIT_DEADLINE_HOURS,
        }
    }

    async fn raw_value(&self, key: PlatformConfigKey) -> Option<String> {
        match self.config_repo.find_value(key.as_str()).await {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    key = key.as_str(),
                    db_error = ?err,
                    "platform_config: failed to read value; using default"
                );
                None
            }
        }
    }
}

pub struct PlatformConfigUseCase<C>
where
    C: PlatformConfigRepository + Send + Sync + 'static,
{
    config_repo: Arc<C>,
}

impl<C> PlatformConfigUseCase<C>
where
    C: PlatformConfigRepository + Send + Sync + 'static,
{
    pub fn new(config_repo: Arc<C>) -> Self {
        Self { config_repo }
    }

    /// Known keys first, with defaults filled in for anything never stored,
    /// followed by any other stored keys.
    pub async fn list_entries(&self) -> UseCaseResult<Vec<PlatformConfigEntryDto>> {
        let stored = self.config_repo.list_entries().await.map_err(|err| {
            error!(db_error = ?err, "platform_config: failed to list entries");
            PlatformConfigError::Internal(err)
        })?;

        let mut stored: HashMap<String, PlatformConfigEntity> = stored
            .into_iter()
            .map(|entry| (entry.key.clone(), entry))
            .collect();

        let mut entries: Vec<PlatformConfigEntryDto> = PlatformConfigKey::ALL
            .iter()
            .map(|key| match stored.remove(key.as_str()) {
                Some(entity) => stored_entry(entity),
                None => PlatformConfigEntryDto {
                    key: key.as_str().to_string(),
                    value: key.default_value(),
                    description: Some(key.description().to_string()),
                    is_default: true,
                    updated_by: None,
                    updated_at: None,
                },
            })
            .collect();

        let mut others: Vec<PlatformConfigEntryDto> =
            stored.into_values().map(stored_entry).collect();
        others.sort_by(|a, b| a.key.cmp(&b.key));
        entries.extend(others);

        Ok(entries)
    }

    pub async fn update_entry(
        &self,
        admin_id: Uuid,
        key: &str,
        request: UpdatePlatformConfigRequest,
    ) -> UseCaseResult<PlatformConfigEntryDto> {
        let config_key = PlatformConfigKey::from_str(key).ok_or_else(|| {
            warn!(%admin_id, key, "platform_config: unknown key");
            PlatformConfigError::UnknownKey(key.to_string())
        })?;

        let value = config_key.validate(&request.value).map_err(|reason| {
            warn!(
                %admin_id,
                key,
                value = %request.value,
                "platform_config: rejected value"
            );
            PlatformConfigError::InvalidValue(reason)
        })?;

        let description = request
            .description
            .filter(|description| !description.trim().is_empty())
            .unwrap_or_else(|| config_key.description().to_string());

        let saved = self
            .config_repo
            .upsert_entry(UpsertPlatformConfigEntity {
                key: config_key.as_str().to_string(),
                value,
                description: Some(description),
                updated_by: Some(admin_id),
                updated_at: Utc::now(),
            })
            .await
            .map_err(|err| {
                error!(%admin_id, key, db_error = ?err, "platform_config: failed to save entry");
                PlatformConfigError::Internal(err)
            })?;

        info!(
            %admin_id,
            key,
            value = %saved.value,
            "platform_config: entry updated"
        );

        Ok(stored_entry(saved))
    }
}

fn stored_entry(entity: PlatformConfigEntity) -> PlatformConfigEntryDto {
    PlatformConfigEntryDto {
        key: entity.key,
        value: entity.value,
        description: entity.description,
        is_default: false,
        updated_by: entity.updated_by,
        updated_at: Some(entity.updated_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use crates::domain::repositories::platform_config::MockPlatformConfigRepository;

    fn entity(key: &str, value: &str) -> PlatformConfigEntity {
        PlatformConfigEntity {
            key: key.to_string(),
            value: value.to_string(),
            description: None,
            updated_by: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn commission_reads_stored_value() {
        let mut repo = MockPlatformConfigRepository::new();
        repo.expect_find_value()
            .withf(|key| key == "commission_deposit_percentage")
            .returning(|_| Ok(Some("4.5".to_string())));

        let settings = PlatformSettings::new(Arc::new(repo));
        assert_eq!(
            settings
                .commission_percentage(CommissionCategory::Deposit)
                .await,
            4.5
        );
    }

    #[tokio::test]
    async fn commission_falls_back_on_missing_invalid_or_failing_reads() {
        let mut repo = MockPlatformConfigRepository::new();
        repo.expect_find_value()
            .withf(|key| key == "commission_full_payment_percentage")
            .times(3)
            .returning({
                let mut calls = 0;
                move |_| {
                    calls += 1;
                    match calls {
                        1 => Ok(None),
                        2 => Ok(Some("250".to_string())),
                        _ => Err(anyhow!("connection refused")),
                    }
                }
            });

        let settings = PlatformSettings::new(Arc::new(repo));
        for _ in 0..3 {
            assert_eq!(
                settings
                    .commission_percentage(CommissionCategory::FullPayment)
                    .await,
                5.0
            );
        }
    }

    #[tokio::test]
    async fn deadline_hours_fall_back_to_default() {
        for stored in ["zero", "9223372036854775807", "8761"] {
            let mut repo = MockPlatformConfigRepository::new();
            repo.expect_find_value()
                .returning(move |_| Ok(Some(stored.to_string())));

            let settings = PlatformSettings::new(Arc::new(repo));
            assert_eq!(
                settings.deposit_deadline_hours().await,
                DEFAULT_DEPOSIT_DEADLINE_HOURS
            );
        }
    }

    #[tokio::test]
    async fn list_merges_defaults_with_stored_values() {
        let mut repo = MockPlatformConfigRepository::new();
        repo.expect_list_entries().returning(|| {
            Ok(vec![
                entity("commission_deposit_percentage", "2"),
                entity("maintenance_banner", "off"),
            ])
        });

        let usecase = PlatformConfigUseCase::new(Arc::new(repo));
        let entries = usecase.list_entries().await.unwrap();

        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "commission_deposit_percentage",
                "commission_full_payment_percentage",
                "deposit_deadline_hours_default",
                "maintenance_banner",
            ]
        );
        assert_eq!(entries[0].value, "2");
        assert!(!entries[0].is_default);
        assert_eq!(entries[1].value, "5");
        assert!(entries[1].is_default);
        assert_eq!(entries[2].value, "24");
    }

    #[tokio::test]
    async fn update_validates_and_records_admin() {
        let admin_id = Uuid::new_v4();
        let mut repo = MockPlatformConfigRepository::new();
        repo.expect_upsert_entry()
            .withf(move |entry| {
                entry.key == "commission_full_payment_percentage"
                    && entry.value == "6.5"
                    && entry.updated_by == Some(admin_id)
            })
            .times(1)
            .returning(|entry| {
                Ok(PlatformConfigEntity {
                    key: entry.key,
                    value: entry.value,
                    description: entry.description,
                    updated_by: entry.updated_by,
                    updated_at: entry.updated_at,
                })
            });

        let usecase = PlatformConfigUseCase::new(Arc::new(repo));
        let saved = usecase
            .update_entry(
                admin_id,
                "commission_full_payment_percentage",
                UpdatePlatformConfigRequest {
                    value: " 6.5 ".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(saved.value, "6.5");
        assert_eq!(saved.updated_by, Some(admin_id));
    }

    #[tokio::test]
    async fn update_rejects_unknown_keys_and_bad_values() {
        let usecase = PlatformConfigUseCase::new(Arc::new(MockPlatformConfigRepository::new()));

        let err = usecase
            .update_entry(
                Uuid::new_v4(),
                "free_money",
                UpdatePlatformConfigRequest {
                    value: "1".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = usecase
            .update_entry(
                Uuid::new_v4(),
                "commission_deposit_percentage",
                UpdatePlatformConfigRequest {
                    value: "120".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
