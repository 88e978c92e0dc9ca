use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use crates::domain::{
    entities::{
        bookings::BookingEntity,
        payments::{InsertPaymentEntity, PaymentEntity},
    },
    repositories::{
        bookings::BookingRepository, payments::PaymentRepository,
        platform_config::PlatformConfigRepository,
    },
    value_objects::{
        commissions::calculate_commission,
        deposit_deadline::deadline_has_passed,
        enums::{
            booking_statuses::BookingStatus, payment_statuses::PaymentStatus,
            payment_types::PaymentType,
        },
        payments::{CheckoutPreferenceRequest, CreatePaymentResponse},
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::{payment_gateway::PaymentGateway, platform_config::PlatformSettings};

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Reserva no encontrada")]
    BookingNotFound,
    #[error("Solo el cliente de la reserva puede pagarla")]
    Forbidden,
    #[error("El plazo para pagar la seña venció")]
    DeadlineExpired,
    #[error("{0}")]
    NotPayable(&'static str),
    #[error("Ya hay otro pago en curso para esta reserva")]
    CheckoutInProgress,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PaymentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::BookingNotFound => StatusCode::NOT_FOUND,
            PaymentError::Forbidden => StatusCode::FORBIDDEN,
            PaymentError::DeadlineExpired
            | PaymentError::NotPayable(_)
            | PaymentError::CheckoutInProgress => StatusCode::CONFLICT,
            PaymentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PaymentError>;

enum PendingCheckout {
    Ready(CreatePaymentResponse),
    NeedsPreference(PaymentEntity),
}

/// Amount the client owes for `payment_type`, or why it cannot be paid now.
pub fn payable_amount(
    booking: &BookingEntity,
    payment_type: PaymentType,
    now: chrono::DateTime<Utc>,
) -> UseCaseResult<i64> {
    let status = booking.booking_status();

    let amount = match payment_type {
        PaymentType::Deposit => {
            if status != BookingStatus::PendingDeposit || booking.deposit_paid {
                return Err(PaymentError::NotPayable(
                    "La seña solo se puede pagar mientras la reserva la espera",
                ));
            }
            if deadline_has_passed(booking.deposit_deadline, now) {
                return Err(PaymentError::DeadlineExpired);
            }
            booking.deposit_amount
        }
        PaymentType::Full => {
            if status != BookingStatus::PendingDeposit
                || booking.deposit_paid
                || booking.full_payment_paid
            {
                return Err(PaymentError::NotPayable(
                    "El pago total solo es posible antes de pagar la seña",
                ));
            }
            if deadline_has_passed(booking.deposit_deadline, now) {
                return Err(PaymentError::DeadlineExpired);
            }
            booking.full_payment_amount()
        }
        PaymentType::Remainder => {
            if status != BookingStatus::Confirmed
                || !booking.deposit_paid
                || booking.full_payment_paid
            {
                return Err(PaymentError::NotPayable(
                    "El saldo solo se puede pagar con la seña abonada y la reserva confirmada",
                ));
            }
            booking.remaining_amount
        }
    };

    if amount <= 0 {
        return Err(PaymentError::NotPayable("No hay monto pendiente de pago"));
    }
    Ok(amount)
}

fn checkout_title(payment_type: PaymentType, booking: &BookingEntity) -> String {
    let label = match payment_type {
        PaymentType::Deposit => "Seña",
        PaymentType::Full => "Pago total",
        PaymentType::Remainder => "Saldo",
    };
    format!(
        "{} turno {}",
        label,
        booking.starts_at.format("%d/%m/%Y %H:%M")
    )
}

pub struct PaymentUseCase<B, P, C, G>
where
    B: BookingRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    C: PlatformConfigRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    booking_repo: Arc<B>,
    payment_repo: Arc<P>,
    settings: Arc<PlatformSettings<C>>,
    gateway: Arc<G>,
}

impl<B, P, C, G> PaymentUseCase<B, P, C, G>
where
    B: BookingRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    C: PlatformConfigRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    pub fn new(
        booking_repo: Arc<B>,
        payment_repo: Arc<P>,
        settings: Arc<PlatformSettings<C>>,
        gateway: Arc<G>,
    ) -> Self {
        Self {
            booking_repo,
            payment_repo,
            settings,
            gateway,
        }
    }

    pub async fn create_payment(
        &self,
        client_id: Uuid,
        payer_email: Option<String>,
        booking_id: Uuid,
        payment_type: PaymentType,
    ) -> UseCaseResult<CreatePaymentResponse> {
        info!(%client_id, %booking_id, %payment_type, "payments: checkout requested");

        let booking = self
            .booking_repo
            .find_by_id(booking_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "payments: failed to load booking");
                PaymentError::Internal(err)
            })?
            .ok_or(PaymentError::BookingNotFound)?;

        if booking.client_id != client_id {
            warn!(%client_id, %booking_id, "payments: checkout requested by non-client");
            return Err(PaymentError::Forbidden);
        }

        let amount = payable_amount(&booking, payment_type, Utc::now()).inspect_err(|err| {
            info!(%booking_id, %payment_type, reason = %err, "payments: booking not payable");
        })?;

        let payment = match self.pending_in_slot(booking_id, payment_type).await? {
            Some(existing) => existing,
            None => match self.record_payment(&booking, payment_type, amount).await? {
                Some(recorded) => PendingCheckout::NeedsPreference(recorded),
                // Lost a race with a concurrent request for the same booking.
                None => self
                    .pending_in_slot(booking_id, payment_type)
                    .await?
                    .ok_or(PaymentError::CheckoutInProgress)?,
            },
        };

        let payment = match payment {
            PendingCheckout::Ready(response) => return Ok(response),
            PendingCheckout::NeedsPreference(payment) => payment,
        };

        let preference = self
            .gateway
            .create_preference(&CheckoutPreferenceRequest {
                payment_id: payment.id,
                title: checkout_title(payment_type, &booking),
                amount: payment.amount,
                payer_email,
            })
            .await
            .map_err(|err| {
                error!(
                    %booking_id,
                    payment_id = %payment.id,
                    error = ?err,
                    "payments: gateway preference creation failed"
                );
                PaymentError::Internal(err)
            })?;

        self.payment_repo
            .attach_preference(
                payment.id,
                preference.preference_id.clone(),
                preference.checkout_url.clone(),
            )
            .await
            .map_err(|err| {
                error!(
                    payment_id = %payment.id,
                    db_error = ?err,
                    "payments: failed to store preference"
                );
                PaymentError::Internal(err)
            })?;

        info!(
            %booking_id,
            payment_id = %payment.id,
            amount = payment.amount,
            preference_id = %preference.preference_id,
            "payments: checkout created"
        );

        Ok(CreatePaymentResponse {
            payment_id: payment.id,
            amount: payment.amount,
            checkout_url: preference.checkout_url,
            reused: false,
        })
    }

    /// Resolves a pending payment that blocks a new checkout of `payment_type`.
    /// A same-type payment with a URL is handed back as is; one without a URL
    /// is left over from a failed preference call and gets retried. A pending
    /// payment of the other upfront type blocks the request.
    async fn pending_in_slot(
        &self,
        booking_id: Uuid,
        payment_type: PaymentType,
    ) -> UseCaseResult<Option<PendingCheckout>> {
        let existing = self
            .payment_repo
            .find_pending_for_booking(booking_id, payment_type.checkout_slot())
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "payments: failed to look up pending payment");
                PaymentError::Internal(err)
            })?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        if existing.payment_type() != Some(payment_type) {
            warn!(
                %booking_id,
                payment_id = %existing.id,
                pending_type = %existing.payment_type,
                requested_type = %payment_type,
                "payments: another upfront checkout is still pending"
            );
            return Err(PaymentError::CheckoutInProgress);
        }

        Ok(Some(match existing.checkout_url.clone() {
            Some(checkout_url) => {
                info!(%booking_id, payment_id = %existing.id, "payments: reusing pending checkout");
                PendingCheckout::Ready(CreatePaymentResponse {
                    payment_id: existing.id,
                    amount: existing.amount,
                    checkout_url,
                    reused: true,
                })
            }
            None => PendingCheckout::NeedsPreference(existing),
        }))
    }

    async fn record_payment(
        &self,
        booking: &BookingEntity,
        payment_type: PaymentType,
        amount: i64,
    ) -> UseCaseResult<Option<PaymentEntity>> {
        let percentage = self
            .settings
            .commission_percentage(payment_type.commission_category())
            .await;
        let commission = calculate_commission(amount, percentage);

        self.payment_repo
            .record_payment(InsertPaymentEntity {
                booking_id: booking.id,
                amount,
                payment_type: payment_type.to_string(),
                status: PaymentStatus::Pending.to_string(),
                platform_commission_amount: commission.commission_amount,
            })
            .await
            .map_err(|err| {
                error!(booking_id = %booking.id, db_error = ?err, "payments: failed to record payment");
                PaymentError::Internal(err)
            })
    }
}
