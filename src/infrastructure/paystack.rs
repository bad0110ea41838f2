use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha512;
use std::time::Duration;
use subtle::ConstantTimeEq;

use crate::config::PaystackConfig;
use crate::domain::payment::{parse_flexible_date, Amount, PaymentMethod};
use crate::domain::ports::{
    GatewayAuthorization, GatewayChargeStatus, GatewayInitialize, GatewayVerification,
    PaymentGateway,
};
use crate::error::{HotelError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type HmacSha512 = Hmac<Sha512>;

/// Hex HMAC-SHA512 digest of `body` under `secret`, the scheme Paystack
/// uses for its `x-paystack-signature` header.
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a webhook signature against the raw body.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    match sign(secret, body) {
        Some(expected) => expected.as_bytes().ct_eq(signature.as_bytes()).into(),
        None => false,
    }
}

/// Thin adapter over Paystack's transaction API.
///
/// This is the only place that speaks minor currency units: amounts are
/// multiplied into kobo/cents on the way out and never on the way in.
pub struct PaystackClient {
    client: Client,
    secret_key: String,
    api_url: String,
}

impl PaystackClient {
    pub fn new(config: &PaystackConfig) -> Result<Self> {
        config.ensure_configured()?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| HotelError::Configuration(err.to_string()))?;
        Ok(Self {
            client,
            secret_key: config.secret_key.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn read_envelope(response: reqwest::Response) -> Result<Envelope> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Envelope>(&body)
                .map(|envelope| envelope.message)
                .unwrap_or(body);
            let message = if message.is_empty() {
                format!("gateway returned status {status}")
            } else {
                message
            };
            return Err(HotelError::GatewayRequest(message));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|err| HotelError::GatewayRequest(format!("Unexpected gateway response: {err}")))?;
        if !envelope.status {
            let message = if envelope.message.is_empty() {
                "gateway reported failure".to_string()
            } else {
                envelope.message
            };
            return Err(HotelError::GatewayRequest(message));
        }
        Ok(envelope)
    }
}

fn transport_error(err: reqwest::Error) -> HotelError {
    if err.is_timeout() {
        HotelError::GatewayTimeout
    } else {
        HotelError::GatewayRequest(err.to_string())
    }
}

/// Major units to the gateway's minor unit.
fn minor_units(amount: Amount) -> Result<i64> {
    (amount.value() * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| HotelError::Validation("Amount out of range".to_string()))
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    #[serde(default)]
    status: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    paid_at: Option<String>,
    #[serde(default)]
    gateway_response: Option<String>,
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize(&self, request: GatewayInitialize) -> Result<GatewayAuthorization> {
        let body = serde_json::json!({
            "email": request.email,
            "amount": minor_units(request.amount)?,
            "currency": request.currency.as_str(),
            "reference": request.reference,
            "callback_url": request.callback_url,
            "metadata": request.metadata,
        });

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.api_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let envelope = Self::read_envelope(response).await?;

        let data: InitializeData = serde_json::from_value(envelope.data.clone())
            .map_err(|err| HotelError::GatewayRequest(format!("Unexpected gateway response: {err}")))?;

        Ok(GatewayAuthorization {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
            reference: data.reference,
            raw: envelope.data,
        })
    }

    async fn verify(&self, reference: &str) -> Result<GatewayVerification> {
        let response = self
            .client
            .get(format!("{}/transaction/verify/{reference}", self.api_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(transport_error)?;
        let envelope = Self::read_envelope(response).await?;

        let data: VerifyData = serde_json::from_value(envelope.data.clone())
            .map_err(|err| HotelError::GatewayRequest(format!("Unexpected gateway response: {err}")))?;

        let status = match data.status.as_str() {
            "success" => GatewayChargeStatus::Success,
            "failed" => GatewayChargeStatus::Failed,
            other => GatewayChargeStatus::Other(other.to_string()),
        };
        let channel = data.channel.and_then(|name| {
            serde_json::from_value::<PaymentMethod>(serde_json::Value::String(name)).ok()
        });
        let paid_at = data
            .paid_at
            .and_then(|value| parse_flexible_date(&value).ok());

        Ok(GatewayVerification {
            status,
            channel,
            paid_at,
            gateway_response: data.gateway_response,
            raw: envelope.data,
        })
    }

    fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> bool {
        verify_signature(&self.secret_key, body, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_signature_roundtrip() {
        let secret = "sk_test_secret";
        let body = br#"{"event":"charge.success"}"#;

        let signature = sign(secret, body).unwrap();
        assert!(verify_signature(secret, body, &signature));
    }

    #[test]
    fn test_signature_rejects_tampered_body() {
        let secret = "sk_test_secret";
        let signature = sign(secret, b"original").unwrap();
        assert!(!verify_signature(secret, b"tampered", &signature));
    }

    #[test]
    fn test_signature_rejects_wrong_secret() {
        let signature = sign("sk_test_a", b"body").unwrap();
        assert!(!verify_signature("sk_test_b", b"body", &signature));
    }

    #[test]
    fn test_minor_units_conversion() {
        assert_eq!(minor_units(Amount::new(dec!(5000)).unwrap()).unwrap(), 500_000);
        assert_eq!(minor_units(Amount::new(dec!(12.5)).unwrap()).unwrap(), 1_250);
    }

    #[test]
    fn test_verify_data_maps_unknown_channel_to_none() {
        let data: VerifyData = serde_json::from_value(serde_json::json!({
            "status": "success",
            "channel": "carrier_pigeon",
            "paid_at": "2024-01-01T10:00:00Z"
        }))
        .unwrap();

        let channel = data.channel.and_then(|name| {
            serde_json::from_value::<PaymentMethod>(serde_json::Value::String(name)).ok()
        });
        assert_eq!(channel, None);
    }

    #[test]
    fn test_client_requires_secret_key() {
        let config = PaystackConfig::new("");
        assert!(matches!(
            PaystackClient::new(&config),
            Err(HotelError::Configuration(_))
        ));
    }
}
