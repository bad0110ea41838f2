use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::derivation::BookingDerivation;
use crate::config::AppConfig;
use crate::domain::payment::{
    parse_flexible_date, Amount, Currency, Payment, PaymentMetadata, PaymentMethod, PaymentStatus,
};
use crate::domain::ports::{
    BookingStoreRef, GatewayChargeStatus, GatewayInitialize, Page, PaymentGatewayRef, PaymentQuery,
    PaymentStoreRef,
};
use crate::domain::reference;
use crate::error::{HotelError, Result};

#[derive(Debug, Clone)]
pub struct InitializePaymentRequest {
    pub amount: Decimal,
    pub email: String,
    pub name: String,
    pub phone_number: String,
    pub currency: Option<Currency>,
    pub description: Option<String>,
    pub metadata: PaymentMetadata,
}

#[derive(Debug, Clone)]
pub struct InitializedPayment {
    pub authorization_url: String,
    pub access_code: String,
    /// Reference the gateway will use in its callback redirect.
    pub reference: String,
    pub payment: Payment,
}

/// Reconciles gateway-side payment state with the persisted records:
/// initialization, client-driven verification and asynchronous webhooks
/// all funnel through here.
pub struct PaymentService {
    payments: PaymentStoreRef,
    gateway: PaymentGatewayRef,
    derivation: BookingDerivation,
    callback_url: String,
}

impl PaymentService {
    pub fn new(
        payments: PaymentStoreRef,
        bookings: BookingStoreRef,
        gateway: PaymentGatewayRef,
        config: &AppConfig,
    ) -> Self {
        Self {
            payments,
            gateway,
            derivation: BookingDerivation::new(bookings),
            callback_url: config.callback_url(),
        }
    }

    /// Starts a checkout with the gateway and persists the resulting
    /// pending payment. A gateway rejection is still persisted, as a
    /// failed record under a fresh reference, for auditability.
    pub async fn initialize(
        &self,
        user_id: Option<String>,
        request: InitializePaymentRequest,
    ) -> Result<InitializedPayment> {
        let amount = Amount::new(request.amount)?;
        let currency = request.currency.unwrap_or_default();
        let reference = reference::payment_reference();

        let gateway_request = GatewayInitialize {
            email: request.email.to_lowercase(),
            amount,
            currency,
            reference: reference.clone(),
            callback_url: self.callback_url.clone(),
            metadata: gateway_metadata(&request, user_id.as_deref()),
        };

        match self.gateway.initialize(gateway_request).await {
            Ok(authorization) => {
                let payment = payment_record(
                    &request,
                    user_id,
                    amount,
                    currency,
                    reference,
                    authorization.reference.clone(),
                    Some(authorization.raw.clone()),
                );
                self.payments.insert(payment.clone()).await?;
                info!(reference = %payment.reference, "payment initialized");

                Ok(InitializedPayment {
                    authorization_url: authorization.authorization_url,
                    access_code: authorization.access_code,
                    reference: authorization.reference,
                    payment,
                })
            }
            Err(err) => {
                warn!(error = %err, "gateway rejected payment initialization");

                // The first reference may have reached the gateway, so the
                // audit record gets a fresh one.
                let audit_reference = reference::payment_reference();
                let mut payment = payment_record(
                    &request,
                    user_id,
                    amount,
                    currency,
                    audit_reference.clone(),
                    audit_reference,
                    None,
                );
                payment.mark_failed(None, err.to_string(), None);
                if let Err(store_err) = self.payments.insert(payment).await {
                    error!(error = %store_err, "could not record failed payment attempt");
                }

                Err(HotelError::PaymentInitialization(err.to_string()))
            }
        }
    }

    /// Polls the gateway for the charge outcome and reconciles the stored
    /// payment. A settled gateway answer settles the record; anything
    /// unresolved leaves a pending record pending and never downgrades a
    /// settled one.
    pub async fn verify(&self, reference: &str) -> Result<Payment> {
        let Some(mut payment) = self.resolve(reference).await? else {
            return Err(HotelError::not_found("Payment"));
        };

        let verification = match self.gateway.verify(reference).await {
            Ok(verification) => verification,
            Err(HotelError::GatewayTimeout) => {
                // Ambiguous outcome: the charge may still settle, so the
                // record stays as it is.
                warn!(reference, "gateway verification timed out");
                return Err(HotelError::GatewayTimeout);
            }
            Err(err) => {
                if payment.status == PaymentStatus::Pending {
                    payment.mark_failed(None, err.to_string(), None);
                    if let Err(store_err) = self.payments.update(payment).await {
                        error!(
                            reference,
                            error = %store_err,
                            "could not record verification failure"
                        );
                    }
                }
                return Err(HotelError::PaymentVerification(err.to_string()));
            }
        };

        match verification.status {
            GatewayChargeStatus::Success => {
                let paid_at = verification
                    .paid_at
                    .or(payment.paid_at)
                    .unwrap_or_else(Utc::now);
                payment.mark_success(verification.channel, paid_at, Some(verification.raw));
                self.payments.update(payment.clone()).await?;
                info!(reference = %payment.reference, "payment verified as successful");
                self.derivation.derive(&payment).await;
            }
            GatewayChargeStatus::Failed => {
                let reason = verification
                    .gateway_response
                    .unwrap_or_else(|| "Payment failed".to_string());
                payment.mark_failed(verification.channel, reason, Some(verification.raw));
                self.payments.update(payment.clone()).await?;
                info!(reference = %payment.reference, "payment verified as failed");
            }
            GatewayChargeStatus::Other(state) => {
                debug!(reference = %payment.reference, state, "charge not settled yet");
                payment.record_unresolved(verification.channel, Some(verification.raw));
                self.payments.update(payment.clone()).await?;
            }
        }

        Ok(payment)
    }

    /// Applies a gateway webhook. The signature is checked against the raw
    /// body before anything else happens; a mismatch has zero side effects.
    pub async fn handle_webhook(&self, raw_body: &[u8], signature: &str) -> Result<()> {
        if !self.gateway.verify_webhook_signature(raw_body, signature) {
            warn!("webhook rejected: invalid signature");
            return Err(HotelError::InvalidSignature);
        }

        let event: WebhookEvent = serde_json::from_slice(raw_body)
            .map_err(|err| HotelError::Validation(format!("Malformed webhook payload: {err}")))?;

        match event.event.as_str() {
            "charge.success" => self.apply_charge(event.data, true).await,
            "charge.failed" => self.apply_charge(event.data, false).await,
            other => {
                debug!(event = other, "ignoring webhook event type");
                Ok(())
            }
        }
    }

    async fn apply_charge(&self, data: serde_json::Value, succeeded: bool) -> Result<()> {
        let Ok(charge) = serde_json::from_value::<WebhookCharge>(data.clone()) else {
            warn!("webhook charge payload missing expected fields; ignoring");
            return Ok(());
        };
        if charge.reference.is_empty() {
            warn!("webhook charge carried no reference; ignoring");
            return Ok(());
        }

        // Unmatched events are acknowledged so the provider stops
        // retrying charges this system never initialized (test events).
        let Some(mut payment) = self.resolve(&charge.reference).await? else {
            warn!(
                reference = %charge.reference,
                "webhook for unknown payment accepted and ignored"
            );
            return Ok(());
        };

        if succeeded {
            let paid_at = charge
                .paid_at
                .or(payment.paid_at)
                .unwrap_or_else(Utc::now);
            payment.mark_success(charge.channel, paid_at, Some(data));
            self.payments.update(payment.clone()).await?;
            info!(reference = %payment.reference, "payment confirmed via webhook");
            self.derivation.derive(&payment).await;
        } else {
            let reason = charge
                .gateway_response
                .unwrap_or_else(|| "Payment failed".to_string());
            payment.mark_failed(charge.channel, reason, Some(data));
            self.payments.update(payment.clone()).await?;
            info!(reference = %payment.reference, "payment failed via webhook");
        }

        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Payment> {
        self.payments
            .get(id)
            .await?
            .ok_or(HotelError::not_found("Payment"))
    }

    pub async fn list(&self, query: PaymentQuery, page: Page) -> Result<Vec<Payment>> {
        self.payments.list(query, page).await
    }

    /// Payment history scoped to one customer, identified by user id,
    /// email or phone number.
    pub async fn list_for_customer(
        &self,
        mut query: PaymentQuery,
        page: Page,
    ) -> Result<Vec<Payment>> {
        if query.user_id.is_none() && query.customer_email.is_none() && query.customer_phone.is_none()
        {
            return Err(HotelError::Validation(
                "Either userId, email, or phoneNumber is required".to_string(),
            ));
        }
        query.customer_email = query.customer_email.map(|email| email.to_lowercase());
        self.payments.list(query, page).await
    }

    /// Two-step reference resolution: the internal space first, then the
    /// gateway space. The spaces are prefixed so they cannot collide.
    async fn resolve(&self, reference: &str) -> Result<Option<Payment>> {
        if let Some(payment) = self.payments.find_by_reference(reference).await? {
            return Ok(Some(payment));
        }
        self.payments.find_by_gateway_reference(reference).await
    }
}

fn payment_record(
    request: &InitializePaymentRequest,
    user_id: Option<String>,
    amount: Amount,
    currency: Currency,
    reference: String,
    gateway_reference: String,
    gateway_response: Option<serde_json::Value>,
) -> Payment {
    let now = Utc::now();
    Payment {
        id: Uuid::new_v4(),
        user_id,
        customer_email: request.email.to_lowercase(),
        customer_name: request.name.clone(),
        customer_phone: request.phone_number.clone(),
        amount,
        currency,
        reference,
        gateway_reference,
        status: PaymentStatus::Pending,
        payment_method: None,
        description: request.description.clone(),
        metadata: request.metadata.clone(),
        booking_id: request.metadata.booking_id.clone(),
        hotel_id: request.metadata.hotel_id.clone(),
        gateway_response,
        failure_reason: None,
        paid_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// The gateway dashboard shows metadata to operators, so the customer
/// fields and the acting user ride along with the caller's bag.
fn gateway_metadata(request: &InitializePaymentRequest, user_id: Option<&str>) -> serde_json::Value {
    let mut value =
        serde_json::to_value(&request.metadata).unwrap_or_else(|_| serde_json::json!({}));
    if let serde_json::Value::Object(map) = &mut value {
        map.insert(
            "customerName".to_string(),
            serde_json::Value::String(request.name.clone()),
        );
        map.insert(
            "customerPhone".to_string(),
            serde_json::Value::String(request.phone_number.clone()),
        );
        if let Some(user_id) = user_id {
            map.insert(
                "userId".to_string(),
                serde_json::Value::String(user_id.to_string()),
            );
        }
    }
    value
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Charge fields pulled out of the webhook payload. Unknown channel names
/// or timestamp formats degrade to `None` instead of failing the event.
#[derive(Debug, Deserialize)]
struct WebhookCharge {
    #[serde(default)]
    reference: String,
    #[serde(default, deserialize_with = "lenient_channel")]
    channel: Option<PaymentMethod>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    gateway_response: Option<String>,
}

fn lenient_channel<'de, D>(deserializer: D) -> std::result::Result<Option<PaymentMethod>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|name| serde_json::from_value(serde_json::Value::String(name)).ok()))
}

fn lenient_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| parse_flexible_date(&value).ok()))
}
