use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use sha2::Sha256;
use tracing::error;

use crate::domain::value_objects::payments::{CheckoutPreference, CheckoutPreferenceRequest};

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_API_URL: &str = "https://api.mercadopago.com";
const CURRENCY_ID: &str = "ARS";

/// Minimal Mercado Pago client built on reqwest.
pub struct MercadoPagoClient {
    http: reqwest::Client,
    api_url: String,
    access_token: String,
    webhook_secret: String,
    notification_url: String,
    success_url: String,
    failure_url: String,
}

/// Body of an incoming webhook notification.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookNotification {
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub action: Option<String>,
    pub data: Option<WebhookNotificationData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookNotificationData {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

impl WebhookNotification {
    pub fn data_id(&self) -> Option<&str> {
        self.data
            .as_ref()
            .map(|data| data.id.as_str())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GatewayPayment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub status: String,
    pub status_detail: Option<String>,
    pub external_reference: Option<String>,
    pub transaction_amount: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GatewayPreapproval {
    pub id: String,
    pub status: String,
    pub external_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorEnvelope {
    message: Option<String>,
    error: Option<String>,
    status: Option<u16>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => Ok(value),
        serde_json::Value::Number(value) => Ok(value.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

impl MercadoPagoClient {
    pub fn new(
        api_url: String,
        access_token: String,
        webhook_secret: String,
        notification_url: String,
        success_url: String,
        failure_url: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            access_token,
            webhook_secret,
            notification_url,
            success_url,
            failure_url,
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (gateway_error, gateway_message, gateway_status) =
            match serde_json::from_str::<GatewayErrorEnvelope>(&body) {
                Ok(envelope) => (envelope.error, envelope.message, envelope.status),
                Err(_) => (None, None, None),
            };

        error!(
            status = %status,
            gateway_request_id = ?request_id,
            gateway_error = ?gateway_error,
            gateway_message = ?gateway_message,
            gateway_status = ?gateway_status,
            response_body = %body,
            context = %context,
            "payment gateway request failed"
        );

        bail!(
            "Payment gateway request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }

    /// Creates a checkout preference and returns its id and redirect URL.
    pub async fn create_preference(
        &self,
        request: &CheckoutPreferenceRequest,
    ) -> Result<CheckoutPreference> {
        let mut body = json!({
            "items": [{
                "id": request.payment_id.to_string(),
                "title": request.title,
                "quantity": 1,
                "currency_id": CURRENCY_ID,
                "unit_price": request.amount,
            }],
            "external_reference": request.payment_id.to_string(),
            "notification_url": self.notification_url,
            "back_urls": {
                "success": self.success_url,
                "failure": self.failure_url,
                "pending": self.success_url,
            },
            "auto_return": "approved",
        });

        if let Some(email) = request.payer_email.as_deref() {
            body["payer"] = json!({ "email": email });
        }

        let resp = self
            .http
            .post(format!("{}/checkout/preferences", self.api_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header(CONTENT_TYPE, "application/json")
            .header("X-Idempotency-Key", request.payment_id.to_string())
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create preference").await?;

        #[derive(Deserialize)]
        struct PreferenceResp {
            id: String,
            init_point: Option<String>,
        }

        let parsed: PreferenceResp = resp.json().await?;
        let checkout_url = parsed
            .init_point
            .ok_or_else(|| anyhow!("Payment gateway preference init_point is missing"))?;

        Ok(CheckoutPreference {
            preference_id: parsed.id,
            checkout_url,
        })
    }

    pub async fn retrieve_payment(&self, gateway_payment_id: &str) -> Result<GatewayPayment> {
        let resp = self
            .http
            .get(format!("{}/v1/payments/{}", self.api_url, gateway_payment_id))
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "retrieve payment").await?;

        Ok(resp.json::<GatewayPayment>().await?)
    }

    pub async fn retrieve_preapproval(&self, preapproval_id: &str) -> Result<GatewayPreapproval> {
        let resp = self
            .http
            .get(format!("{}/preapproval/{}", self.api_url, preapproval_id))
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "retrieve preapproval").await?;

        Ok(resp.json::<GatewayPreapproval>().await?)
    }

    pub fn verify_webhook_signature(
        &self,
        data_id: &str,
        request_id: Option<&str>,
        signature_header: &str,
        tolerance_seconds: i64,
    ) -> Result<()> {
        verify_webhook_signature(
            &self.webhook_secret,
            data_id,
            request_id,
            signature_header,
            Utc::now(),
            tolerance_seconds,
        )
    }
}

/// Checks an `x-signature: ts=<ts>,v1=<hex>` header.
///
/// The signed manifest is `id:<data id>;request-id:<x-request-id>;ts:<ts>;`,
/// with the request-id part omitted when the header is absent. `ts` may be in
/// seconds or milliseconds.
pub fn verify_webhook_signature(
    secret: &str,
    data_id: &str,
    request_id: Option<&str>,
    signature_header: &str,
    now: DateTime<Utc>,
    tolerance_seconds: i64,
) -> Result<()> {
    let mut timestamp: Option<&str> = None;
    let mut signature: Option<&str> = None;

    for part in signature_header.split(',') {
        let part = part.trim();
        if let Some(rest) = part.strip_prefix("ts=") {
            timestamp = Some(rest);
        } else if let Some(rest) = part.strip_prefix("v1=") {
            signature = Some(rest);
        }
    }

    let timestamp = timestamp.ok_or_else(|| anyhow!("missing ts in x-signature"))?;
    let signature = signature.ok_or_else(|| anyhow!("missing v1 in x-signature"))?;

    let ts_value: i64 = timestamp
        .parse()
        .map_err(|_| anyhow!("invalid ts in x-signature"))?;
    let ts_seconds = if ts_value > 1_000_000_000_000 {
        ts_value / 1_000
    } else {
        ts_value
    };
    if now.timestamp().abs_diff(ts_seconds) > tolerance_seconds.max(0).unsigned_abs() {
        bail!("webhook timestamp outside tolerance");
    }

    let mut manifest = format!("id:{};", data_id.to_ascii_lowercase());
    if let Some(request_id) = request_id.filter(|value| !value.is_empty()) {
        manifest.push_str(&format!("request-id:{};", request_id));
    }
    manifest.push_str(&format!("ts:{};", timestamp));

    let provided = hex::decode(signature)?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(manifest.as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| anyhow!("invalid webhook signature"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SECRET: &str = "test-webhook-secret";

    fn sign(manifest: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(manifest.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000, 0).single().unwrap()
    }

    #[test]
    fn accepts_a_valid_signature() {
        let v1 = sign("id:123456;request-id:req-1;ts:1760000000;");
        let header = format!("ts=1760000000,v1={v1}");
        verify_webhook_signature(SECRET, "123456", Some("req-1"), &header, now(), 300).unwrap();
    }

    #[test]
    fn accepts_millisecond_timestamps_and_missing_request_id() {
        let v1 = sign("id:abc;ts:1760000000123;");
        let header = format!("ts=1760000000123, v1={v1}");
        verify_webhook_signature(SECRET, "ABC", None, &header, now(), 300).unwrap();
    }

    #[test]
    fn rejects_tampered_data_id() {
        let v1 = sign("id:123456;request-id:req-1;ts:1760000000;");
        let header = format!("ts=1760000000,v1={v1}");
        let err = verify_webhook_signature(SECRET, "999999", Some("req-1"), &header, now(), 300)
            .unwrap_err();
        assert!(err.to_string().contains("invalid webhook signature"));
    }

    #[test]
    fn rejects_stale_timestamps() {
        let v1 = sign("id:123456;ts:1759990000;");
        let header = format!("ts=1759990000,v1={v1}");
        let err =
            verify_webhook_signature(SECRET, "123456", None, &header, now(), 300).unwrap_err();
        assert!(err.to_string().contains("tolerance"));
    }

    #[test]
    fn rejects_timestamps_at_integer_limits() {
        for ts in [i64::MIN, i64::MAX] {
            let v1 = sign(&format!("id:123456;ts:{ts};"));
            let header = format!("ts={ts},v1={v1}");
            let err =
                verify_webhook_signature(SECRET, "123456", None, &header, now(), 300).unwrap_err();
            assert!(err.to_string().contains("tolerance"));
        }
    }

    #[test]
    fn rejects_malformed_headers() {
        assert!(verify_webhook_signature(SECRET, "1", None, "v1=abcd", now(), 300).is_err());
        assert!(verify_webhook_signature(SECRET, "1", None, "ts=1760000000", now(), 300).is_err());
        assert!(
            verify_webhook_signature(SECRET, "1", None, "ts=1760000000,v1=zz", now(), 300)
                .is_err()
        );
    }

    #[test]
    fn notification_ids_may_be_numbers_or_strings() {
        let numeric: WebhookNotification =
            serde_json::from_str(r#"{"type":"payment","action":"payment.updated","data":{"id":42}}"#)
                .unwrap();
        assert_eq!(numeric.data_id(), Some("42"));

        let text: WebhookNotification =
            serde_json::from_str(r#"{"type":"subscription_preapproval","data":{"id":"2c93"}}"#)
                .unwrap();
        assert_eq!(text.data_id(), Some("2c93"));
        assert_eq!(text.type_.as_deref(), Some("subscription_preapproval"));
    }
}
