//! Payment gateway client (Paystack)
//!
//! Covers the three touch points the marketplace needs: initialize a
//! transaction, verify it by reference, and authenticate webhook callbacks.
//! Amounts are integer minor units (kobo for NGN).

use std::time::Duration;

use kernel::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{constant_time_eq, hmac_sha512_hex};

pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co";
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub secret_key: Option<String>,
    pub public_key: Option<String>,
    pub base_url: String,
    pub callback_url: Option<String>,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            public_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            callback_url: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Payment gateway is not configured")]
    NotConfigured,

    #[error("Payment gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Payment gateway declined the request: {0}")]
    Declined(String),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match &err {
            GatewayError::NotConfigured => {
                AppError::service_unavailable("Payments are not available").with_source(err)
            }
            GatewayError::Declined(message) => {
                AppError::bad_request(format!("Payment gateway: {message}")).with_source(err)
            }
            GatewayError::Transport(_) => {
                AppError::bad_gateway("Payment gateway unreachable").with_source(err)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InitializeRequest {
    pub email: String,
    /// Minor units.
    pub amount: i64,
    pub reference: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Transaction state reported by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionData {
    pub reference: String,
    pub status: String,
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub paid_at: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

impl TransactionData {
    pub fn is_successful(&self) -> bool {
        self.status == "success"
    }

    /// Final failure. Anything neither successful nor failed is still in
    /// flight (`ongoing`, `pending`, `processing`, `abandoned`, ...).
    pub fn is_failed(&self) -> bool {
        matches!(self.status.as_str(), "failed" | "reversed")
    }
}

/// Webhook body. Only `charge.success` is acted on.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: TransactionData,
}

#[derive(Deserialize)]
struct Envelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

#[derive(Clone)]
pub struct PaystackClient {
    client: reqwest::Client,
    config: PaystackConfig,
}

impl PaystackClient {
    pub fn new(config: PaystackConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }

    fn secret(&self) -> Result<&str, GatewayError> {
        self.config
            .secret_key
            .as_deref()
            .ok_or(GatewayError::NotConfigured)
    }

    pub async fn initialize(
        &self,
        mut request: InitializeRequest,
    ) -> Result<InitializedTransaction, GatewayError> {
        let secret = self.secret()?;
        if request.callback_url.is_none() {
            request.callback_url = self.config.callback_url.clone();
        }

        let envelope: Envelope<InitializedTransaction> = self
            .client
            .post(format!("{}/transaction/initialize", self.config.base_url))
            .bearer_auth(secret)
            .json(&request)
            .send()
            .await?
            .json()
            .await?;

        unwrap_envelope(envelope)
    }

    pub async fn verify(&self, reference: &str) -> Result<TransactionData, GatewayError> {
        let secret = self.secret()?;
        let envelope: Envelope<TransactionData> = self
            .client
            .get(format!(
                "{}/transaction/verify/{}",
                self.config.base_url, reference
            ))
            .bearer_auth(secret)
            .send()
            .await?
            .json()
            .await?;

        unwrap_envelope(envelope)
    }

    /// Check `x-paystack-signature` against the raw request body.
    pub fn verify_signature(&self, body: &[u8], signature: &str) -> bool {
        match self.config.secret_key.as_deref() {
            Some(secret) => verify_webhook_signature(secret, body, signature),
            None => false,
        }
    }
}

fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T, GatewayError> {
    match (envelope.status, envelope.data) {
        (true, Some(data)) => Ok(data),
        _ => Err(GatewayError::Declined(envelope.message)),
    }
}

/// Webhook signature: lowercase hex HMAC-SHA512 of the body keyed by the secret key.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let expected = hmac_sha512_hex(secret.as_bytes(), body);
    constant_time_eq(expected.as_bytes(), signature.trim().to_ascii_lowercase().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_outcome() {
        let tx = |status: &str| TransactionData {
            reference: "r1".into(),
            status: status.into(),
            amount: 5000,
            currency: None,
            paid_at: None,
            channel: None,
        };
        assert!(tx("success").is_successful());
        assert!(tx("failed").is_failed());
        assert!(tx("reversed").is_failed());
        for status in ["ongoing", "pending", "processing", "abandoned", "queued"] {
            assert!(!tx(status).is_successful(), "{status}");
            assert!(!tx(status).is_failed(), "{status}");
        }
    }

    #[test]
    fn test_webhook_signature() {
        let body = br#"{"event":"charge.success","data":{"reference":"r1","status":"success","amount":5000}}"#;
        let signature = hmac_sha512_hex(b"sk_test_x", body);

        assert!(verify_webhook_signature("sk_test_x", body, &signature));
        assert!(verify_webhook_signature("sk_test_x", body, &signature.to_uppercase()));
        assert!(!verify_webhook_signature("sk_test_y", body, &signature));
        assert!(!verify_webhook_signature("sk_test_x", b"{}", &signature));
        assert!(!verify_webhook_signature("sk_test_x", body, ""));
    }

    #[test]
    fn test_unconfigured_client_rejects_signatures() {
        let client = PaystackClient::new(PaystackConfig::default());
        assert!(!client.verify_signature(b"{}", "00"));
    }

    #[test]
    fn test_envelope_unwrapping() {
        let ok: Envelope<TransactionData> = serde_json::from_str(
            r#"{"status":true,"message":"Verification successful",
                "data":{"reference":"r1","status":"success","amount":250000,"currency":"NGN"}}"#,
        )
        .unwrap();
        let data = unwrap_envelope(ok).unwrap();
        assert!(data.is_successful());
        assert_eq!(data.amount, 250000);

        let declined: Envelope<TransactionData> =
            serde_json::from_str(r#"{"status":false,"message":"Transaction reference not found"}"#)
                .unwrap();
        let err = unwrap_envelope(declined).unwrap_err();
        assert!(matches!(err, GatewayError::Declined(m) if m.contains("not found")));
    }

    #[tokio::test]
    async fn test_unconfigured_verify() {
        let client = PaystackClient::new(PaystackConfig::default());
        let err = client
            .verify("ref")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotConfigured));
        assert_eq!(AppError::from(err).status_code(), 503);
    }
}
