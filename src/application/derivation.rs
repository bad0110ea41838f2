use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::payment::Payment;
use crate::domain::ports::{BookingStoreRef, DerivedBooking};
use crate::domain::reference;

pub const DEFAULT_HOTEL_ID: &str = "HORTENCIA_HOTEL";
const DEFAULT_ROOM_TYPE: &str = "Room";

/// Turns a successful payment into a booking, exactly once per payment.
///
/// Derivation is best-effort enrichment: every failure path returns `None`
/// so the payment-confirmation response to the caller is never blocked on
/// it. Payments without stay dates in their metadata (deposits, generic
/// charges) are simply not bookings.
pub struct BookingDerivation {
    bookings: BookingStoreRef,
}

impl BookingDerivation {
    pub fn new(bookings: BookingStoreRef) -> Self {
        Self { bookings }
    }

    pub async fn derive(&self, payment: &Payment) -> Option<Booking> {
        let metadata = &payment.metadata;

        let (Some(check_in), Some(check_out)) = (metadata.check_in, metadata.check_out) else {
            warn!(
                payment = %payment.reference,
                "cannot create booking: missing check-in or check-out date"
            );
            return None;
        };
        if check_out <= check_in {
            warn!(
                payment = %payment.reference,
                "cannot create booking: check-out is not after check-in"
            );
            return None;
        }

        let booking_hint = payment
            .booking_id
            .clone()
            .or_else(|| metadata.booking_id.clone());
        let hotel_id = payment
            .hotel_id
            .clone()
            .or_else(|| metadata.hotel_id.clone())
            .unwrap_or_else(|| DEFAULT_HOTEL_ID.to_string());
        let room_type = metadata
            .room_type
            .clone()
            .unwrap_or_else(|| DEFAULT_ROOM_TYPE.to_string());
        // The bookingId hint encodes the room as its last underscore-separated
        // segment.
        let room_id = booking_hint
            .as_ref()
            .map(|hint| hint.rsplit('_').next().unwrap_or(hint).to_string());

        let nights = metadata
            .nights
            .filter(|n| *n > 0)
            .unwrap_or_else(|| night_count(check_in, check_out));

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: payment.user_id.clone(),
            payment_id: payment.id,
            booking_reference: reference::booking_reference(),
            customer_email: payment.customer_email.clone(),
            customer_name: payment.customer_name.clone(),
            customer_phone: payment.customer_phone.clone(),
            hotel_id,
            room_id,
            room_type,
            check_in,
            check_out,
            number_of_guests: metadata.guests.unwrap_or(1),
            number_of_nights: nights,
            total_amount: payment.amount,
            currency: payment.currency,
            status: BookingStatus::Confirmed,
            payment_reference: payment.reference.clone(),
            metadata: metadata.clone(),
            created_at: now,
            updated_at: now,
        };

        match self.bookings.create_for_payment(booking).await {
            Ok(DerivedBooking::Created(booking)) => {
                info!(
                    booking = %booking.booking_reference,
                    payment = %payment.reference,
                    "booking created from payment"
                );
                Some(booking)
            }
            Ok(DerivedBooking::Exists(booking)) => {
                info!(
                    booking = %booking.booking_reference,
                    payment = %payment.reference,
                    "booking already exists for payment"
                );
                Some(booking)
            }
            Err(err) => {
                error!(
                    payment = %payment.reference,
                    error = %err,
                    "failed to create booking from payment"
                );
                None
            }
        }
    }
}

/// Ceiling of the stay length in whole days, at least one night.
fn night_count(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> u32 {
    let seconds = (check_out - check_in).num_seconds().max(0) as u64;
    seconds.div_ceil(86_400).max(1) as u32
}
