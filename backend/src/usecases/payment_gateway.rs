use anyhow::Result as AnyResult;
use async_trait::async_trait;
use crates::{
    domain::value_objects::payments::{CheckoutPreference, CheckoutPreferenceRequest},
    payments::mercado_pago_client::{GatewayPayment, GatewayPreapproval, MercadoPagoClient},
};

/// Signature material taken from a webhook request.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookSignature {
    pub data_id: String,
    pub request_id: Option<String>,
    pub header: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_preference(
        &self,
        request: &CheckoutPreferenceRequest,
    ) -> AnyResult<CheckoutPreference>;

    async fn retrieve_payment(&self, gateway_payment_id: &str) -> AnyResult<GatewayPayment>;

    async fn retrieve_preapproval(&self, preapproval_id: &str) -> AnyResult<GatewayPreapproval>;

    fn verify_webhook_signature(
        &self,
        signature: &WebhookSignature,
        tolerance_seconds: i64,
    ) -> AnyResult<()>;
}

#[async_trait]
impl PaymentGateway for MercadoPagoClient {
    async fn create_preference(
        &self,
        request: &CheckoutPreferenceRequest,
    ) -> AnyResult<CheckoutPreference> {
        self.create_preference(request).await
    }

    async fn retrieve_payment(&self, gateway_payment_id: &str) -> AnyResult<GatewayPayment> {
        self.retrieve_payment(gateway_payment_id).await
    }

    async fn retrieve_preapproval(&self, preapproval_id: &str) -> AnyResult<GatewayPreapproval> {
        self.retrieve_preapproval(preapproval_id).await
    }

    fn verify_webhook_signature(
        &self,
        signature: &WebhookSignature,
        tolerance_seconds: i64,
    ) -> AnyResult<()> {
        self.verify_webhook_signature(
            &signature.data_id,
            signature.request_id.as_deref(),
            &signature.header,
            tolerance_seconds,
        )
    }
}
