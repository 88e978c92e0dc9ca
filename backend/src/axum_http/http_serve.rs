use crate::{
    axum_http::{default_routers, rate_limit::RateLimitState, routers},
    config::config_model::DotEnvyConfig,
    usecases::{platform_config::PlatformSettings, rate_limiter::RateLimiter},
};
use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::{
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{platform_config::PlatformConfigPostgres, rate_limits::RateLimitPostgres},
    },
    payments::mercado_pago_client::MercadoPagoClient,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let gateway_config = &config.payment_gateway;
    let gateway = Arc::new(MercadoPagoClient::new(
        gateway_config.api_url.clone(),
        gateway_config.access_token.clone(),
        gateway_config.webhook_secret.clone(),
        gateway_config.notification_url.clone(),
        gateway_config.success_url.clone(),
        gateway_config.failure_url.clone(),
    ));

    let settings = Arc::new(PlatformSettings::new(Arc::new(PlatformConfigPostgres::new(
        Arc::clone(&db_pool),
    ))));

    let limiter = Arc::new(RateLimiter::new(
        Arc::new(RateLimitPostgres::new(Arc::clone(&db_pool))),
        config.rate_limit.max_requests,
        config.rate_limit.window_seconds,
    ));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/bookings",
            routers::bookings::routes(
                Arc::clone(&db_pool),
                settings,
                Arc::clone(&gateway),
                RateLimitState::new(Arc::clone(&limiter), "payments"),
            ),
        )
        .nest(
            "/api/v1/webhooks",
            routers::webhooks::routes(
                Arc::clone(&db_pool),
                gateway,
                gateway_config.webhook_tolerance_seconds,
                RateLimitState::new(limiter, "webhooks"),
            ),
        )
        .nest(
            "/api/v1/admin/platform-config",
            routers::platform_config::routes(Arc::clone(&db_pool)),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::PUT])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        port = config.backend_server.port,
        stage = %config.stage,
        "http_serve: backend listening"
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = ?err, "http_serve: failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = ?err, "http_serve: failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("http_serve: received CTRL+C"),
        _ = terminate => info!("http_serve: received SIGTERM"),
    }
}
