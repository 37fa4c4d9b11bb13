//! Payment gateway client (Toss Payments).
//!
//! Confirms and cancels payments the browser widget has already authorised.
//! Authentication is HTTP Basic with the secret key as user name and an
//! empty password.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::PaymentConfig;

/// Reason sent when the caller gives none.
pub const DEFAULT_CANCEL_REASON: &str = "Customer request";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// No secret key is configured.
    #[error("payment gateway is not configured")]
    NotConfigured,

    /// The gateway answered with a non-2xx status.
    #[error("payment rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    /// The request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered 2xx with an unexpected body.
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}

/// Error body returned by the gateway.
#[derive(Debug, Deserialize)]
struct GatewayError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Body of `POST /api/payment/confirm`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    #[serde(default)]
    pub payment_key: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
}

/// Body of `POST /api/payment/cancel`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    #[serde(default)]
    pub payment_key: Option<String>,
    #[serde(default)]
    pub cancel_reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GatewayConfirm<'a> {
    payment_key: &'a str,
    order_id: &'a str,
    amount: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GatewayCancel<'a> {
    cancel_reason: &'a str,
}

/// Subset of the gateway's payment object we pass back to the client.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayPayment {
    #[serde(default)]
    order_name: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    approved_at: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Result of a confirmed payment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedPayment {
    pub payment_key: String,
    pub order_id: String,
    pub amount: i64,
    pub order_name: Option<String>,
    pub method: Option<String>,
    pub approved_at: Option<String>,
    pub status: Option<String>,
}

/// Result of a cancelled payment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanceledPayment {
    pub payment_key: String,
    pub status: String,
}

/// Payment gateway client.
#[derive(Clone)]
pub struct PaymentClient {
    inner: Arc<PaymentClientInner>,
}

struct PaymentClientInner {
    client: reqwest::Client,
    api_url: String,
    /// `None` when no secret key is configured.
    authorization: Option<HeaderValue>,
}

impl PaymentClient {
    /// Create a new payment client.
    #[must_use]
    pub fn new(config: &PaymentConfig) -> Self {
        let authorization = config
            .secret_key
            .as_ref()
            .and_then(|key| basic_auth_header(key.expose_secret()));

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            inner: Arc::new(PaymentClientInner {
                client,
                api_url: config.api_url.clone(),
                authorization,
            }),
        }
    }

    /// Confirm an authorised payment.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotConfigured` without a secret key,
    /// `PaymentError::Rejected` when the gateway refuses, and
    /// `PaymentError::Http` on transport failures.
    #[instrument(skip(self, payment_key))]
    pub async fn confirm(
        &self,
        payment_key: &str,
        order_id: &str,
        amount: i64,
    ) -> Result<ConfirmedPayment, PaymentError> {
        let authorization = self.authorization()?;
        let url = format!("{}/v1/payments/confirm", self.inner.api_url);

        let response = self
            .inner
            .client
            .post(&url)
            .header(AUTHORIZATION, authorization)
            .json(&GatewayConfirm {
                payment_key,
                order_id,
                amount,
            })
            .send()
            .await?;

        let payment: GatewayPayment = handle_response(response).await?;
        tracing::info!(order_id, amount, "Payment confirmed");

        Ok(ConfirmedPayment {
            payment_key: payment_key.to_owned(),
            order_id: order_id.to_owned(),
            amount,
            order_name: payment.order_name,
            method: payment.method,
            approved_at: payment.approved_at,
            status: payment.status,
        })
    }

    /// Cancel a confirmed payment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::confirm`].
    #[instrument(skip(self, cancel_reason))]
    pub async fn cancel(
        &self,
        payment_key: &str,
        cancel_reason: Option<&str>,
    ) -> Result<CanceledPayment, PaymentError> {
        let authorization = self.authorization()?;
        let url = format!(
            "{}/v1/payments/{}/cancel",
            self.inner.api_url,
            urlencoding::encode(payment_key)
        );
        let cancel_reason = cancel_reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_CANCEL_REASON);

        let response = self
            .inner
            .client
            .post(&url)
            .header(AUTHORIZATION, authorization)
            .json(&GatewayCancel { cancel_reason })
            .send()
            .await?;

        let payment: GatewayPayment = handle_response(response).await?;
        tracing::info!(payment_key, "Payment canceled");

        Ok(CanceledPayment {
            payment_key: payment_key.to_owned(),
            status: payment.status.unwrap_or_else(|| "CANCELED".to_owned()),
        })
    }

    fn authorization(&self) -> Result<HeaderValue, PaymentError> {
        self.inner
            .authorization
            .clone()
            .ok_or(PaymentError::NotConfigured)
    }
}

/// `Basic base64("{secret}:")`, marked sensitive so it is never logged.
fn basic_auth_header(secret: &str) -> Option<HeaderValue> {
    let encoded = STANDARD.encode(format!("{secret}:"));
    let mut value = HeaderValue::from_str(&format!("Basic {encoded}")).ok()?;
    value.set_sensitive(true);
    Some(value)
}

async fn handle_response<T>(response: reqwest::Response) -> Result<T, PaymentError>
where
    T: serde::de::DeserializeOwned + Default,
{
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let parsed = serde_json::from_str::<GatewayError>(&body).ok();
        let code = parsed
            .as_ref()
            .and_then(|e| e.code.clone())
            .unwrap_or_else(|| status.as_u16().to_string());
        let message = parsed
            .and_then(|e| e.message)
            .unwrap_or_else(|| "Payment was not approved".to_owned());
        tracing::warn!(status = %status, code = %code, "Payment gateway rejected request");
        return Err(PaymentError::Rejected { code, message });
    }

    if body.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&body).map_err(|e| PaymentError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn test_basic_auth_header_encodes_secret_with_colon() {
        let value = basic_auth_header("test_sk_123").unwrap();
        // base64("test_sk_123:")
        assert_eq!(value.to_str().unwrap(), "Basic dGVzdF9za18xMjM6");
        assert!(value.is_sensitive());
    }

    #[tokio::test]
    async fn test_unconfigured_client_reports_not_configured() {
        let client = PaymentClient::new(&PaymentConfig {
            secret_key: None,
            api_url: "http://127.0.0.1:9".to_owned(),
        });

        let result = client.confirm("pk", "order-1", 1000).await;
        assert!(matches!(result, Err(PaymentError::NotConfigured)));

        let result = client.cancel("pk", None).await;
        assert!(matches!(result, Err(PaymentError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_http_error() {
        // Port 9 (discard) is closed on test machines, so the connection is refused.
        let client = PaymentClient::new(&PaymentConfig {
            secret_key: Some(SecretString::from("test_sk_123")),
            api_url: "http://127.0.0.1:9".to_owned(),
        });

        let result = client.confirm("pk", "order-1", 1000).await;
        assert!(matches!(result, Err(PaymentError::Http(_))));
    }

    #[test]
    fn test_gateway_error_deserialization() {
        let err: GatewayError =
            serde_json::from_str(r#"{"code":"REJECT_CARD_COMPANY","message":"Card declined"}"#)
                .unwrap();
        assert_eq!(err.code.as_deref(), Some("REJECT_CARD_COMPANY"));
        assert_eq!(err.message.as_deref(), Some("Card declined"));
    }

    #[test]
    fn test_confirm_request_accepts_missing_fields() {
        let req: ConfirmRequest = serde_json::from_str(r#"{"paymentKey":"pk"}"#).unwrap();
        assert_eq!(req.payment_key.as_deref(), Some("pk"));
        assert!(req.order_id.is_none());
        assert!(req.amount.is_none());
    }
}
