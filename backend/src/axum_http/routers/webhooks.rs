use crate::{
    axum_http::rate_limit::{RateLimitState, enforce_rate_limit},
    usecases::{
        payment_webhook::{PaymentWebhookUseCase, WebhookError},
        subscription_webhook::SubscriptionWebhookUseCase,
    },
};
use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    middleware,
    response::IntoResponse,
    routing::post,
};
use crates::{
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            bookings::BookingPostgres, merchants::MerchantPostgres, payments::PaymentPostgres,
            transfers::TransferPostgres,
        },
    },
    payments::mercado_pago_client::{MercadoPagoClient, WebhookNotification},
};
use serde_json::json;
use std::sync::Arc;

type PaymentWebhooks = PaymentWebhookUseCase<
    PaymentPostgres,
    BookingPostgres,
    MerchantPostgres,
    TransferPostgres,
    MercadoPagoClient,
>;
type SubscriptionWebhooks = SubscriptionWebhookUseCase<MerchantPostgres, MercadoPagoClient>;

#[derive(Clone)]
pub struct WebhookRoutesState {
    payments: Arc<PaymentWebhooks>,
    subscriptions: Arc<SubscriptionWebhooks>,
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    gateway: Arc<MercadoPagoClient>,
    tolerance_seconds: i64,
    rate_limit: RateLimitState,
) -> Router {
    let merchant_repository = Arc::new(MerchantPostgres::new(Arc::clone(&db_pool)));

    let payments = PaymentWebhookUseCase::new(
        Arc::new(PaymentPostgres::new(Arc::clone(&db_pool))),
        Arc::new(BookingPostgres::new(Arc::clone(&db_pool))),
        Arc::clone(&merchant_repository),
        Arc::new(TransferPostgres::new(Arc::clone(&db_pool))),
        Arc::clone(&gateway),
        tolerance_seconds,
    );
    let subscriptions =
        SubscriptionWebhookUseCase::new(merchant_repository, gateway, tolerance_seconds);

    Router::new()
        .route("/payments", post(payment_notification))
        .route("/subscriptions", post(subscription_notification))
        .route_layer(middleware::from_fn_with_state(rate_limit, enforce_rate_limit))
        .with_state(WebhookRoutesState {
            payments: Arc::new(payments),
            subscriptions: Arc::new(subscriptions),
        })
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub async fn payment_notification(
    State(state): State<WebhookRoutesState>,
    headers: HeaderMap,
    Json(notification): Json<WebhookNotification>,
) -> Result<impl IntoResponse, WebhookError> {
    let outcome = state
        .payments
        .handle(
            notification,
            header(&headers, "x-request-id"),
            header(&headers, "x-signature"),
        )
        .await?;
    Ok(Json(json!({ "outcome": outcome })))
}

pub async fn subscription_notification(
    State(state): State<WebhookRoutesState>,
    headers: HeaderMap,
    Json(notification): Json<WebhookNotification>,
) -> Result<impl IntoResponse, WebhookError> {
    let outcome = state
        .subscriptions
        .handle(
            notification,
            header(&headers, "x-request-id"),
            header(&headers, "x-signature"),
        )
        .await?;
    Ok(Json(json!({ "outcome": outcome })))
}
