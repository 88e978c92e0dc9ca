use crate::{
    auth::AuthUser,
    axum_http::rate_limit::{RateLimitState, enforce_rate_limit},
    usecases::{
        bookings::{BookingError, BookingUseCase},
        payments::{PaymentError, PaymentUseCase},
        platform_config::PlatformSettings,
    },
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use crates::{
    domain::value_objects::{
        bookings::{ReserveBookingRequest, UpdateBookingStatusRequest},
        payments::CreatePaymentRequest,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            bookings::BookingPostgres, merchants::MerchantPostgres, payments::PaymentPostgres,
            platform_config::PlatformConfigPostgres,
        },
    },
    payments::mercado_pago_client::MercadoPagoClient,
};
use std::sync::Arc;
use uuid::Uuid;

type Bookings = BookingUseCase<BookingPostgres, MerchantPostgres, PlatformConfigPostgres>;
type Payments =
    PaymentUseCase<BookingPostgres, PaymentPostgres, PlatformConfigPostgres, MercadoPagoClient>;

#[derive(Clone)]
pub struct BookingRoutesState {
    bookings: Arc<Bookings>,
    payments: Arc<Payments>,
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    settings: Arc<PlatformSettings<PlatformConfigPostgres>>,
    gateway: Arc<MercadoPagoClient>,
    rate_limit: RateLimitState,
) -> Router {
    let booking_repository = Arc::new(BookingPostgres::new(Arc::clone(&db_pool)));
    let merchant_repository = Arc::new(MerchantPostgres::new(Arc::clone(&db_pool)));
    let payment_repository = Arc::new(PaymentPostgres::new(Arc::clone(&db_pool)));

    let bookings = BookingUseCase::new(
        Arc::clone(&booking_repository),
        merchant_repository,
        Arc::clone(&settings),
    );
    let payments = PaymentUseCase::new(booking_repository, payment_repository, settings, gateway);

    Router::new()
        .route("/", post(reserve))
        .route("/:id/payment-summary", get(payment_summary))
        .route("/:id/status", patch(update_status))
        .route(
            "/:id/payments",
            post(create_payment)
                .route_layer(middleware::from_fn_with_state(rate_limit, enforce_rate_limit)),
        )
        .with_state(BookingRoutesState {
            bookings: Arc::new(bookings),
            payments: Arc::new(payments),
        })
}

pub async fn reserve(
    State(state): State<BookingRoutesState>,
    auth: AuthUser,
    Json(request): Json<ReserveBookingRequest>,
) -> Result<impl IntoResponse, BookingError> {
    let booking = state.bookings.reserve(auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn payment_summary(
    State(state): State<BookingRoutesState>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, BookingError> {
    let summary = state
        .bookings
        .payment_summary(auth.user_id, booking_id)
        .await?;
    Ok(Json(summary))
}

pub async fn update_status(
    State(state): State<BookingRoutesState>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<UpdateBookingStatusRequest>,
) -> Result<impl IntoResponse, BookingError> {
    let booking = state
        .bookings
        .update_status(auth.user_id, booking_id, request.status)
        .await?;
    Ok(Json(booking))
}

pub async fn create_payment(
    State(state): State<BookingRoutesState>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, PaymentError> {
    let checkout = state
        .payments
        .create_payment(auth.user_id, auth.email, booking_id, request.payment_type)
        .await?;
    let status = if checkout.reused {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(checkout)))
}
