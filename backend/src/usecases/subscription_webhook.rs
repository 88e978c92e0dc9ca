use std::sync::Arc;

use crates::{
    domain::repositories::merchants::MerchantRepository,
    payments::mercado_pago_client::WebhookNotification,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::{
    payment_gateway::PaymentGateway,
    payment_webhook::{WebhookError, WebhookOutcome, authenticate_notification},
};

pub const PREAPPROVAL_NOTIFICATION_TYPE: &str = "subscription_preapproval";

/// Premium flag implied by a preapproval status, if any.
pub fn premium_flag_for(preapproval_status: &str) -> Option<bool> {
    match preapproval_status {
        "authorized" => Some(true),
        "paused" | "cancelled" => Some(false),
        _ => None,
    }
}

pub struct SubscriptionWebhookUseCase<M, G>
where
    M: MerchantRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    merchant_repo: Arc<M>,
    gateway: Arc<G>,
    tolerance_seconds: i64,
}

impl<M, G> SubscriptionWebhookUseCase<M, G>
where
    M: MerchantRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    pub fn new(merchant_repo: Arc<M>, gateway: Arc<G>, tolerance_seconds: i64) -> Self {
        Self {
            merchant_repo,
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

        if notification.type_.as_deref() != Some(PREAPPROVAL_NOTIFICATION_TYPE) {
            info!(
                %data_id,
                notification_type = ?notification.type_,
                "subscription_webhook: ignoring notification"
            );
            return Ok(WebhookOutcome::Ignored);
        }

        let preapproval = self
            .gateway
            .retrieve_preapproval(&data_id)
            .await
            .map_err(|err| {
                error!(%data_id, error = ?err, "subscription_webhook: failed to fetch preapproval");
                WebhookError::Internal(err)
            })?;

        let Some(merchant_id) = preapproval
            .external_reference
            .as_deref()
            .and_then(|reference| Uuid::parse_str(reference.trim()).ok())
        else {
            warn!(
                preapproval_id = %preapproval.id,
                "subscription_webhook: preapproval has no merchant reference"
            );
            return Ok(WebhookOutcome::Ignored);
        };

        let Some(is_premium) = premium_flag_for(&preapproval.status) else {
            info!(
                %merchant_id,
                status = %preapproval.status,
                "subscription_webhook: status needs no action"
            );
            return Ok(WebhookOutcome::Ignored);
        };

        let updated = self
            .merchant_repo
            .set_premium_status(merchant_id, is_premium, Some(preapproval.id.clone()))
            .await
            .map_err(|err| {
                error!(%merchant_id, db_error = ?err, "subscription_webhook: failed to update merchant");
                WebhookError::Internal(err)
            })?;

        if !updated {
            warn!(%merchant_id, "subscription_webhook: merchant not found");
            return Ok(WebhookOutcome::Ignored);
        }

        info!(%merchant_id, is_premium, "subscription_webhook: premium status updated");
        Ok(if is_premium {
            WebhookOutcome::PremiumGranted
        } else {
            WebhookOutcome::PremiumRevoked
        })
    }
}
