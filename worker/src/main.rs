use anyhow::Result;
use crates::{
    domain::repositories::{
        bookings::BookingRepository, payouts::PayoutGateway, rate_limits::RateLimitRepository,
        transfers::TransferRepository,
    },
    infra::{
        db::{
            postgres::postgres_connection,
            repositories::{
                bookings::BookingPostgres, rate_limits::RateLimitPostgres,
                transfers::TransferPostgres,
            },
        },
        payouts::simulated::SimulatedPayoutGateway,
    },
};
use std::sync::Arc;
use tracing::{error, info};
use worker::{
    axum_http::{self, routers::sweeps::SweepRouteState},
    config,
    services::worker_loop::{self, SweepDependencies},
    usecases::{
        expire_unpaid_deposits::ExpireUnpaidDepositsUseCase,
        settle_pending_transfers::SettlePendingTransfersUseCase,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!(error = ?error, "worker: exited with error");
        eprintln!("worker exited with error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!(
        interval_seconds = dotenvy_env.sweeps.interval_seconds,
        internal_api = dotenvy_env.sweeps.internal_token.is_some(),
        "worker: configuration loaded"
    );

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("worker: postgres pool established");
    let db_pool_arc = Arc::new(postgres_pool);

    let booking_repository: Arc<dyn BookingRepository + Send + Sync> =
        Arc::new(BookingPostgres::new(Arc::clone(&db_pool_arc)));
    let transfer_repository: Arc<dyn TransferRepository + Send + Sync> =
        Arc::new(TransferPostgres::new(Arc::clone(&db_pool_arc)));
    let rate_limit_repository: Arc<dyn RateLimitRepository + Send + Sync> =
        Arc::new(RateLimitPostgres::new(Arc::clone(&db_pool_arc)));
    let payout_gateway: Arc<dyn PayoutGateway + Send + Sync> =
        Arc::new(SimulatedPayoutGateway::new());

    let expire_deposits = Arc::new(ExpireUnpaidDepositsUseCase::new(booking_repository));
    let settle_transfers = Arc::new(SettlePendingTransfersUseCase::new(
        transfer_repository,
        payout_gateway,
    ));

    let sweep_loop = tokio::spawn(worker_loop::run_worker_loop(
        SweepDependencies {
            expire_deposits: Arc::clone(&expire_deposits),
            settle_transfers: Arc::clone(&settle_transfers),
            rate_limits: rate_limit_repository,
            settlement_batch_limit: dotenvy_env.sweeps.settlement_batch_limit,
        },
        dotenvy_env.sweeps.interval_seconds,
    ));

    let sweep_state = SweepRouteState {
        internal_token: dotenvy_env.sweeps.internal_token.clone(),
        settlement_batch_limit: dotenvy_env.sweeps.settlement_batch_limit,
        expire_deposits,
        settle_transfers,
    };
    let server_config = Arc::clone(&dotenvy_env);
    let internal_server =
        tokio::spawn(async move { axum_http::http_serve::start(server_config, sweep_state).await });

    tokio::select! {
        result = sweep_loop => result??,
        result = internal_server => result??,
    };
    Ok(())
}
