use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use crates::{
    domain::{
        entities::{payments::PaymentEntity, transfers::InsertTransferEntity},
        repositories::{
            bookings::BookingRepository, merchants::MerchantRepository,
            payments::PaymentRepository, transfers::TransferRepository,
        },
        value_objects::enums::{
            payment_statuses::PaymentStatus, payment_types::PaymentType,
            transfer_statuses::TransferStatus,
        },
    },
    payments::mercado_pago_client::{GatewayPayment, WebhookNotification},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::payment_gateway::{PaymentGateway, WebhookSignature};

pub const PAYMENT_NOTIFICATION_TYPE: &str = "payment";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            WebhookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// What a delivery did; acknowledged to the gateway either way.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    Ignored,
    Approved,
    AlreadyProcessed,
    Closed,
    PremiumGranted,
    PremiumRevoked,
}

/// Checks the signature and returns the notification's data id.
pub fn authenticate_notification<G>(
    gateway: &G,
    notification: &WebhookNotification,
    request_id: Option<String>,
    signature_header: Option<String>,
    tolerance_seconds: i64,
) -> Result<String, WebhookError>
where
    G: PaymentGateway + ?Sized,
{
    let data_id = notification
        .data_id()
        .ok_or(WebhookError::InvalidPayload("missing data.id"))?
        .to_string();
    let header = signature_header.ok_or(WebhookError::InvalidSignature)?;

    gateway
        .verify_webhook_signature(
            &WebhookSignature {
                data_id: data_id.clone(),
                request_id,
                header,
            },
            tolerance_seconds,
        )
        .map_err(|err| {
            warn!(%data_id, reason = %err, "webhooks: signature rejected");
            WebhookError::InvalidSignature
        })?;

    Ok(data_id)
}

pub struct PaymentWebhookUseCase<P, B, M, T, G>
where
    P: PaymentRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    M: MerchantRepository + Send + Sync + 'static,
    T: TransferRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    payment_repo: Arc<P>,
    booking_repo: Arc<B>,
    merchant_repo: Arc<M>,
    transfer_repo: Arc<T>,
    gateway: Arc<G>,
    tolerance_seconds: i64,
}

impl<P, B, M, T, G> PaymentWebhookUseCase<P, B, M, T, G>
where
    P: PaymentRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    M: MerchantRepository + Send + Sync + 'static,
    T: TransferRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    pub fn new(
        payment_repo: Arc<P>,
        booking_repo: Arc<B>,
        merchant_repo: Arc<M>,
        transfer_repo: Arc<T>,
        gateway: Arc<G>,
        tolerance_seconds: i64,
    ) -> Self {
        Self {
            payment_repo,
            booking_repo,
            merchant_repo,
            transfer_repo,
            gateway,
            tolerance_seconds,
        }
    }

    pub async fn handle(
        &self,
        notification: WebhookNotification,
        request_id: Option<String>,
        signature_header: Option<String>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let data_id = authenticate_notification(
            self.gateway.as_ref(),
            &notification,
            request_id,
            signature_header,
            self.tolerance_seconds,
        )?;

        if notification.type_.as_deref() != Some(PAYMENT_NOTIFICATION_TYPE) {
            info!(
                %data_id,
                notification_type = ?notification.type_,
                "payment_webhook: ignoring non-payment notification"
            );
            return Ok(WebhookOutcome::Ignored);
        }

        let gateway_payment = self.gateway.retrieve_payment(&data_id).await.map_err(|err| {
            error!(%data_id, error = ?err, "payment_webhook: failed to fetch gateway payment");
            WebhookError::Internal(err)
        })?;

        let Some(payment) = self.find_referenced_payment(&gateway_payment).await? else {
            return Ok(WebhookOutcome::Ignored);
        };

        match PaymentStatus::from_gateway_status(&gateway_payment.status) {
            Some(PaymentStatus::Approved) => self.approve(payment, &gateway_payment).await,
            Some(status @ (PaymentStatus::Rejected | PaymentStatus::Cancelled)) => {
                let closed = self
                    .payment_repo
                    .close_if_pending(payment.id, status, gateway_payment.id.clone())
                    .await
                    .map_err(|err| {
                        error!(payment_id = %payment.id, db_error = ?err, "payment_webhook: failed to close payment");
                        WebhookError::Internal(err)
                    })?;
                info!(
                    payment_id = %payment.id,
                    %status,
                    closed,
                    "payment_webhook: payment closed by gateway"
                );
                Ok(if closed {
                    WebhookOutcome::Closed
                } else {
                    WebhookOutcome::AlreadyProcessed
                })
            }
            _ => {
                info!(
                    payment_id = %payment.id,
                    gateway_status = %gateway_payment.status,
                    "payment_webhook: status needs no action"
                );
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn find_referenced_payment(
        &self,
        gateway_payment: &GatewayPayment,
    ) -> Result<Option<PaymentEntity>, WebhookError> {
        let Some(payment_id) = gateway_payment
            .external_reference
            .as_deref()
            .and_then(|reference| Uuid::parse_str(reference.trim()).ok())
        else {
            warn!(
                gateway_payment_id = %gateway_payment.id,
                external_reference = ?gateway_payment.external_reference,
                "payment_webhook: payment has no usable external reference"
            );
            return Ok(None);
        };

        let payment = self.payment_repo.find_by_id(payment_id).await.map_err(|err| {
            error!(%payment_id, db_error = ?err, "payment_webhook: failed to load payment");
            WebhookError::Internal(err)
        })?;

        if payment.is_none() {
            warn!(%payment_id, "payment_webhook: referenced payment not found");
        }
        Ok(payment)
    }

    async fn approve(
        &self,
        payment: PaymentEntity,
        gateway_payment: &GatewayPayment,
    ) -> Result<WebhookOutcome, WebhookError> {
        let payment_id = payment.id;

        if let Some(amount) = gateway_payment.transaction_amount {
            if (amount - payment.amount as f64).abs() >= 0.5 {
                warn!(
                    %payment_id,
                    expected = payment.amount,
                    received = amount,
                    "payment_webhook: approved amount differs from payment"
                );
            }
        }

        let (payment, outcome) = match self
            .payment_repo
            .approve_if_pending(payment_id, gateway_payment.id.clone(), Utc::now())
            .await
            .map_err(|err| {
                error!(%payment_id, db_error = ?err, "payment_webhook: failed to approve payment");
                WebhookError::Internal(err)
            })? {
            Some(approved) => (approved, WebhookOutcome::Approved),
            None => match self.reload_approved(payment_id).await? {
                // A previous delivery approved it but may have failed before the
                // booking update or transfer; both steps are idempotent.
                Some(approved) => {
                    info!(%payment_id, "payment_webhook: payment already approved; replaying side effects");
                    (approved, WebhookOutcome::AlreadyProcessed)
                }
                None => {
                    info!(%payment_id, "payment_webhook: payment no longer pending; skipping side effects");
                    return Ok(WebhookOutcome::AlreadyProcessed);
                }
            },
        };

        let booking_id = payment.booking_id;
        let booking_updated = match payment.payment_type() {
            Some(PaymentType::Deposit) => self
                .booking_repo
                .confirm_with_payment(booking_id, false)
                .await
                .map(|booking| booking.is_some()),
            Some(PaymentType::Full) => self
                .booking_repo
                .confirm_with_payment(booking_id, true)
                .await
                .map(|booking| booking.is_some()),
            Some(PaymentType::Remainder) => {
                self.booking_repo.mark_full_payment_paid(booking_id).await
            }
            None => {
                warn!(%payment_id, payment_type = %payment.payment_type, "payment_webhook: unknown payment type");
                Ok(false)
            }
        }
        .map_err(|err| {
            error!(%payment_id, %booking_id, db_error = ?err, "payment_webhook: failed to update booking");
            WebhookError::Internal(err)
        })?;

        if booking_updated {
            info!(%payment_id, %booking_id, "payment_webhook: booking updated");
        } else {
            warn!(
                %payment_id,
                %booking_id,
                "payment_webhook: booking not in a payable state; payment kept as approved"
            );
        }

        self.create_transfer(&payment).await?;

        Ok(outcome)
    }

    async fn reload_approved(&self, payment_id: Uuid) -> Result<Option<PaymentEntity>, WebhookError> {
        let payment = self.payment_repo.find_by_id(payment_id).await.map_err(|err| {
            error!(%payment_id, db_error = ?err, "payment_webhook: failed to reload payment");
            WebhookError::Internal(err)
        })?;

        Ok(payment.filter(|payment| payment.payment_status() == Some(PaymentStatus::Approved)))
    }

    async fn create_transfer(&self, payment: &PaymentEntity) -> Result<(), WebhookError> {
        let payment_id = payment.id;

        let booking = self
            .booking_repo
            .find_by_id(payment.booking_id)
            .await
            .map_err(WebhookError::Internal)?
            .ok_or_else(|| {
                WebhookError::Internal(anyhow::anyhow!(
                    "booking {} of payment {} not found",
                    payment.booking_id,
                    payment_id
                ))
            })?;

        let merchant = self
            .merchant_repo
            .find_by_id(booking.merchant_id)
            .await
            .map_err(WebhookError::Internal)?;

        let Some(destination) = merchant
            .as_ref()
            .and_then(|merchant| merchant.payout_destination())
        else {
            warn!(
                %payment_id,
                merchant_id = %booking.merchant_id,
                "settlement: merchant has no payout account; transfer skipped"
            );
            return Ok(());
        };

        let created = self
            .transfer_repo
            .create_if_absent(InsertTransferEntity {
                payment_id,
                merchant_id: booking.merchant_id,
                amount_total: payment.amount,
                amount_commission: payment.platform_commission_amount,
                amount_to_transfer: payment.amount - payment.platform_commission_amount,
                destination_account: destination.to_string(),
                status: TransferStatus::Pending.to_string(),
            })
            .await
            .map_err(|err| {
                error!(%payment_id, db_error = ?err, "settlement: failed to create transfer");
                WebhookError::Internal(err)
            })?;

        match created {
            Some(transfer_id) => info!(
                %payment_id,
                %transfer_id,
                amount_to_transfer = payment.amount - payment.platform_commission_amount,
                "settlement: transfer created"
            ),
            None => info!(%payment_id, "settlement: transfer already exists"),
        }

        Ok(())
    }
}
