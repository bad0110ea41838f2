use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::payment::{Amount, Currency, PaymentMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Assigned,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// The booking lifecycle: confirmed → assigned → completed, with
    /// cancellation possible until the stay is over.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Assigned)
                | (Confirmed, Cancelled)
                | (Assigned, Completed)
                | (Assigned, Cancelled)
        )
    }
}

/// A stay derived from a successful payment.
///
/// Customer fields are a snapshot taken at derivation time, not a live
/// reference to the payment. `payment_id` is set once and never reassigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub payment_id: Uuid,
    pub booking_reference: String,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub hotel_id: String,
    pub room_id: Option<String>,
    pub room_type: String,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub number_of_guests: u32,
    pub number_of_nights: u32,
    pub total_amount: Amount,
    pub currency: Currency,
    pub status: BookingStatus,
    /// Internal reference of the payment this booking was derived from.
    pub payment_reference: String,
    pub metadata: PaymentMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
