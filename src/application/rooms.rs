use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::booking::BookingStatus;
use crate::domain::payment::{Amount, Currency};
use crate::domain::room::{Occupancy, Room, RoomStatus};
use crate::domain::ports::{BookingStoreRef, Page, RoomQuery, RoomStoreRef};
use crate::error::{HotelError, Result};

#[derive(Debug, Clone)]
pub struct NewRoom {
    pub room_number: String,
    pub room_type: String,
    pub description: Option<String>,
    pub price_per_night: Decimal,
    pub currency: Option<Currency>,
    pub max_occupancy: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct RoomUpdate {
    pub room_number: Option<String>,
    pub room_type: Option<String>,
    pub description: Option<String>,
    pub price_per_night: Option<Decimal>,
    pub currency: Option<Currency>,
    pub max_occupancy: Option<u32>,
    pub status: Option<RoomStatus>,
}

/// A walk-in guest taking a room without a booking.
#[derive(Debug, Clone)]
pub struct WalkInOccupant {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
}

/// Moves rooms between `available` and `occupied`, keeping room state and
/// booking state in step. The occupancy invariants themselves live in the
/// store so concurrent admin actions cannot race past them.
pub struct RoomService {
    rooms: RoomStoreRef,
    bookings: BookingStoreRef,
}

impl RoomService {
    pub fn new(rooms: RoomStoreRef, bookings: BookingStoreRef) -> Self {
        Self { rooms, bookings }
    }

    pub async fn create(&self, new_room: NewRoom) -> Result<Room> {
        let now = Utc::now();
        let room = Room {
            id: Uuid::new_v4(),
            room_number: new_room.room_number,
            room_type: new_room.room_type,
            description: new_room.description,
            price_per_night: Amount::new(new_room.price_per_night)?,
            currency: new_room.currency.unwrap_or_default(),
            max_occupancy: new_room.max_occupancy.unwrap_or(2),
            status: RoomStatus::Available,
            current_booking: None,
            occupant_name: None,
            occupant_email: None,
            occupant_phone: None,
            check_in_date: None,
            check_out_date: None,
            created_at: now,
            updated_at: now,
        };
        self.rooms.insert(room.clone()).await?;
        Ok(room)
    }

    pub async fn update(&self, id: Uuid, update: RoomUpdate) -> Result<Room> {
        let mut room = self.get(id).await?;

        if let Some(room_number) = update.room_number {
            room.room_number = room_number;
        }
        if let Some(room_type) = update.room_type {
            room.room_type = room_type;
        }
        if let Some(description) = update.description {
            room.description = Some(description);
        }
        if let Some(price) = update.price_per_night {
            room.price_per_night = Amount::new(price)?;
        }
        if let Some(currency) = update.currency {
            room.currency = currency;
        }
        if let Some(max_occupancy) = update.max_occupancy {
            room.max_occupancy = max_occupancy;
        }
        if let Some(status) = update.status {
            room.status = status;
        }
        room.updated_at = Utc::now();

        self.rooms.update(room.clone()).await?;
        Ok(room)
    }

    pub async fn get(&self, id: Uuid) -> Result<Room> {
        self.rooms
            .get(id)
            .await?
            .ok_or(HotelError::not_found("Room"))
    }

    pub async fn list(&self, query: RoomQuery, page: Page) -> Result<Vec<Room>> {
        self.rooms.list(query, page).await
    }

    /// Checks a booked guest into a room. Advancing the booking to
    /// `assigned` is part of the same logical transaction as occupying
    /// the room; when the second write fails the inconsistency is
    /// surfaced for operator remediation instead of being swallowed.
    pub async fn assign_to_booking(&self, room_id: Uuid, booking_id: Uuid) -> Result<Room> {
        let mut booking = self
            .bookings
            .get(booking_id)
            .await?
            .ok_or(HotelError::not_found("Booking"))?;

        if booking.check_out < Utc::now() {
            return Err(HotelError::StaleBooking);
        }
        if !booking.status.can_transition_to(BookingStatus::Assigned) {
            return Err(HotelError::Validation(
                "Booking cannot be assigned in its current status".to_string(),
            ));
        }

        let occupancy = Occupancy {
            booking_id: Some(booking.id),
            booking_reference: Some(booking.booking_reference.clone()),
            occupant_name: booking.customer_name.clone(),
            occupant_email: Some(booking.customer_email.clone()),
            occupant_phone: Some(booking.customer_phone.clone()),
            check_in: booking.check_in,
            check_out: Some(booking.check_out),
        };
        let room = self.rooms.assign(room_id, occupancy).await?;

        booking.status = BookingStatus::Assigned;
        booking.updated_at = Utc::now();
        if let Err(err) = self.bookings.update(booking.clone()).await {
            error!(
                room = %room.room_number,
                booking = %booking.booking_reference,
                error = %err,
                "room occupied but booking status update failed"
            );
            return Err(HotelError::PartialAssignment(format!(
                "room {} is occupied but booking {} could not be marked assigned",
                room.room_number, booking.booking_reference
            )));
        }

        info!(
            room = %room.room_number,
            booking = %booking.booking_reference,
            "room assigned to booking"
        );
        Ok(room)
    }

    /// Walk-in assignment: same occupancy rules, no booking link.
    pub async fn assign_manual(&self, room_id: Uuid, occupant: WalkInOccupant) -> Result<Room> {
        let occupancy = Occupancy {
            booking_id: None,
            booking_reference: None,
            occupant_name: occupant.name.clone(),
            occupant_email: occupant.email.map(|email| email.to_lowercase()),
            occupant_phone: occupant.phone,
            check_in: occupant.check_in.unwrap_or_else(Utc::now),
            check_out: occupant.check_out,
        };
        let room = self.rooms.assign(room_id, occupancy).await?;
        info!(
            room = %room.room_number,
            occupant = %occupant.name,
            "room manually assigned"
        );
        Ok(room)
    }

    /// Checks the room out. A linked booking still in `assigned` moves to
    /// `completed`.
    pub async fn unassign(&self, room_id: Uuid) -> Result<Room> {
        let (room, booking_id) = self.rooms.release(room_id).await?;

        if let Some(booking_id) = booking_id {
            match self.bookings.get(booking_id).await {
                Ok(Some(mut booking)) if booking.status == BookingStatus::Assigned => {
                    booking.status = BookingStatus::Completed;
                    booking.updated_at = Utc::now();
                    if let Err(err) = self.bookings.update(booking.clone()).await {
                        error!(
                            room = %room.room_number,
                            booking = %booking.booking_reference,
                            error = %err,
                            "room released but booking completion failed"
                        );
                        return Err(HotelError::PartialAssignment(format!(
                            "room {} was released but booking {} could not be marked completed",
                            room.room_number, booking.booking_reference
                        )));
                    }
                    info!(
                        booking = %booking.booking_reference,
                        "booking completed after checkout"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    error!(
                        room = %room.room_number,
                        error = %err,
                        "room released but linked booking could not be loaded"
                    );
                    return Err(HotelError::PartialAssignment(format!(
                        "room {} was released but its booking could not be loaded",
                        room.room_number
                    )));
                }
            }
        }

        info!(room = %room.room_number, "room checked out");
        Ok(room)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.rooms.delete_vacant(id).await
    }
}
