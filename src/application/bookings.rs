use chrono::Utc;
use uuid::Uuid;

use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::ports::{BookingQuery, BookingStoreRef, Page};
use crate::error::{HotelError, Result};

/// Read and administrative operations on bookings. Creation is not here:
/// bookings only come into existence through payment derivation.
pub struct BookingService {
    bookings: BookingStoreRef,
}

impl BookingService {
    pub fn new(bookings: BookingStoreRef) -> Self {
        Self { bookings }
    }

    pub async fn get(&self, id: Uuid) -> Result<Booking> {
        self.bookings
            .get(id)
            .await?
            .ok_or(HotelError::not_found("Booking"))
    }

    pub async fn list(&self, mut query: BookingQuery, page: Page) -> Result<Vec<Booking>> {
        query.customer_email = query.customer_email.map(|email| email.to_lowercase());
        self.bookings.list(query, page).await
    }

    /// Status changes must follow the booking lifecycle; arbitrary jumps
    /// are rejected.
    pub async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking> {
        let mut booking = self.get(id).await?;

        if !booking.status.can_transition_to(status) {
            return Err(HotelError::Validation(
                "Requested booking status transition is not allowed".to_string(),
            ));
        }

        booking.status = status;
        booking.updated_at = Utc::now();
        self.bookings.update(booking.clone()).await?;
        Ok(booking)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.bookings.delete(id).await? {
            return Err(HotelError::not_found("Booking"));
        }
        Ok(())
    }
}
