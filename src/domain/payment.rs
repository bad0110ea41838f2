use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::HotelError;

/// A positive monetary amount in major currency units.
///
/// Minor-unit (kobo/cent) conversion happens only inside the gateway
/// client; every other component works with major units.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, HotelError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(HotelError::Validation(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = HotelError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Ngn,
    Usd,
    Ghs,
    Zar,
    Kes,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Ngn => "NGN",
            Currency::Usd => "USD",
            Currency::Ghs => "GHS",
            Currency::Zar => "ZAR",
            Currency::Kes => "KES",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    /// Terminal states are never reverted to pending by a stale update.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Success | PaymentStatus::Failed | PaymentStatus::Cancelled
        )
    }
}

/// Settlement channel reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Bank,
    Ussd,
    Qr,
    MobileMoney,
    BankTransfer,
}

/// Booking intent carried alongside a payment.
///
/// Known fields are typed; anything else the caller sends survives in the
/// flattened extension map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[serde(
        deserialize_with = "flexible_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub check_in: Option<DateTime<Utc>>,
    #[serde(
        deserialize_with = "flexible_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub check_out: Option<DateTime<Utc>>,
    #[serde(alias = "numberOfGuests", skip_serializing_if = "Option::is_none")]
    pub guests: Option<u32>,
    #[serde(alias = "numberOfNights", skip_serializing_if = "Option::is_none")]
    pub nights: Option<u32>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Accepts RFC 3339 timestamps as well as plain `YYYY-MM-DD` dates
/// (midnight UTC), since booking frontends send both.
fn flexible_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_flexible_date(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

pub fn parse_flexible_date(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(DateTime::from_naive_utc_and_offset(
            date.and_time(NaiveTime::MIN),
            Utc,
        ));
    }
    Err(format!("unrecognized date format: {value}"))
}

/// A payment record tracked against the external gateway.
///
/// `reference` is generated internally and never changes;
/// `gateway_reference` is whatever the provider issued back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub amount: Amount,
    pub currency: Currency,
    pub reference: String,
    pub gateway_reference: String,
    pub status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub description: Option<String>,
    pub metadata: PaymentMetadata,
    pub booking_id: Option<String>,
    pub hotel_id: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
    pub failure_reason: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Settles the payment as confirmed.
    pub fn mark_success(
        &mut self,
        channel: Option<PaymentMethod>,
        paid_at: DateTime<Utc>,
        raw: Option<serde_json::Value>,
    ) {
        self.status = PaymentStatus::Success;
        if channel.is_some() {
            self.payment_method = channel;
        }
        self.paid_at = Some(paid_at);
        self.failure_reason = None;
        if raw.is_some() {
            self.gateway_response = raw;
        }
        self.updated_at = Utc::now();
    }

    /// Settles the payment as failed with the gateway's diagnostic.
    pub fn mark_failed(
        &mut self,
        channel: Option<PaymentMethod>,
        reason: impl Into<String>,
        raw: Option<serde_json::Value>,
    ) {
        self.status = PaymentStatus::Failed;
        if channel.is_some() {
            self.payment_method = channel;
        }
        self.failure_reason = Some(reason.into());
        if raw.is_some() {
            self.gateway_response = raw;
        }
        self.updated_at = Utc::now();
    }

    /// Records an unresolved gateway answer without settling. No-op on a
    /// terminal record so a stale poll cannot drag it back to pending.
    pub fn record_unresolved(
        &mut self,
        channel: Option<PaymentMethod>,
        raw: Option<serde_json::Value>,
    ) {
        if self.is_terminal() {
            return;
        }
        self.status = PaymentStatus::Pending;
        if channel.is_some() {
            self.payment_method = channel;
        }
        if raw.is_some() {
            self.gateway_response = raw;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(HotelError::Validation(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(HotelError::Validation(_))
        ));
    }

    #[test]
    fn test_currency_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Currency::Ngn).unwrap(), "\"NGN\"");
        let parsed: Currency = serde_json::from_str("\"GHS\"").unwrap();
        assert_eq!(parsed, Currency::Ghs);
    }

    #[test]
    fn test_payment_method_wire_names() {
        let parsed: PaymentMethod = serde_json::from_str("\"mobile_money\"").unwrap();
        assert_eq!(parsed, PaymentMethod::MobileMoney);
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(),
            "\"bank_transfer\""
        );
    }

    #[test]
    fn test_metadata_accepts_plain_dates_and_aliases() {
        let metadata: PaymentMetadata = serde_json::from_str(
            r#"{
                "checkIn": "2024-02-01",
                "checkOut": "2024-02-03T12:00:00Z",
                "numberOfGuests": 3,
                "roomType": "Deluxe",
                "promoCode": "SUMMER"
            }"#,
        )
        .unwrap();

        let check_in = metadata.check_in.unwrap();
        assert_eq!(check_in.to_rfc3339(), "2024-02-01T00:00:00+00:00");
        assert!(metadata.check_out.is_some());
        assert_eq!(metadata.guests, Some(3));
        assert_eq!(metadata.room_type.as_deref(), Some("Deluxe"));
        assert_eq!(
            metadata.extra.get("promoCode"),
            Some(&serde_json::json!("SUMMER"))
        );
    }

    #[test]
    fn test_metadata_rejects_garbage_dates() {
        let result = serde_json::from_str::<PaymentMetadata>(r#"{"checkIn": "next tuesday"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_terminal_status_is_not_reverted_by_unresolved_update() {
        let mut payment = sample_payment();
        payment.mark_success(Some(PaymentMethod::Card), Utc::now(), None);

        payment.record_unresolved(None, None);

        assert_eq!(payment.status, PaymentStatus::Success);
        assert!(payment.paid_at.is_some());
    }

    #[test]
    fn test_mark_failed_keeps_existing_channel_when_none_reported() {
        let mut payment = sample_payment();
        payment.payment_method = Some(PaymentMethod::Card);

        payment.mark_failed(None, "Declined", None);

        assert_eq!(payment.status, PaymentStatus::Failed);
        assert_eq!(payment.payment_method, Some(PaymentMethod::Card));
        assert_eq!(payment.failure_reason.as_deref(), Some("Declined"));
    }

    fn sample_payment() -> Payment {
        let now = Utc::now();
        Payment {
            id: Uuid::new_v4(),
            user_id: None,
            customer_email: "guest@example.com".to_string(),
            customer_name: "Guest".to_string(),
            customer_phone: "+2348000000000".to_string(),
            amount: Amount::new(dec!(5000)).unwrap(),
            currency: Currency::Ngn,
            reference: "HORTENCIA_PAYMENT_1_AB12CD34".to_string(),
            gateway_reference: "GW123".to_string(),
            status: PaymentStatus::Pending,
            payment_method: None,
            description: None,
            metadata: PaymentMetadata::default(),
            booking_id: None,
            hotel_id: None,
            gateway_response: None,
            failure_reason: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
