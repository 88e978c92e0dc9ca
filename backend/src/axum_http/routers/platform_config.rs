use crate::{
    auth::AuthUser,
    usecases::platform_config::{PlatformConfigError, PlatformConfigUseCase},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, put},
};
use crates::{
    domain::value_objects::platform_config::UpdatePlatformConfigRequest,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::platform_config::PlatformConfigPostgres,
    },
};
use std::sync::Arc;
use tracing::warn;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let config_repository = PlatformConfigPostgres::new(Arc::clone(&db_pool));
    let config_usecase = PlatformConfigUseCase::new(Arc::new(config_repository));

    Router::new()
        .route("/", get(list_entries))
        .route("/:key", put(update_entry))
        .with_state(Arc::new(config_usecase))
}

fn require_admin(auth: &AuthUser) -> Result<(), PlatformConfigError> {
    if auth.is_admin() {
        Ok(())
    } else {
        warn!(user_id = %auth.user_id, role = %auth.role, "platform_config: admin role required");
        Err(PlatformConfigError::Forbidden)
    }
}

pub async fn list_entries(
    State(usecase): State<Arc<PlatformConfigUseCase<PlatformConfigPostgres>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, PlatformConfigError> {
    require_admin(&auth)?;
    Ok(Json(usecase.list_entries().await?))
}

pub async fn update_entry(
    State(usecase): State<Arc<PlatformConfigUseCase<PlatformConfigPostgres>>>,
    auth: AuthUser,
    Path(key): Path<String>,
    Json(request): Json<UpdatePlatformConfigRequest>,
) -> Result<impl IntoResponse, PlatformConfigError> {
    require_admin(&auth)?;
    Ok(Json(usecase.update_entry(auth.user_id, &key, request).await?))
}
