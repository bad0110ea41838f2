use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::booking::Booking;
use crate::domain::payment::Payment;
use crate::domain::ports::{
    BookingQuery, BookingStore, DerivedBooking, Page, PaymentQuery, PaymentStore, RoomQuery,
    RoomStore,
};
use crate::domain::room::{Occupancy, Room, RoomStatus};
use crate::error::{HotelError, Result};

fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset())
        .take(page.limit)
        .collect()
}

#[derive(Default)]
struct PaymentsInner {
    payments: HashMap<Uuid, Payment>,
    by_reference: HashMap<String, Uuid>,
    by_gateway_reference: HashMap<String, Uuid>,
}

/// In-memory payment store. One lock guards the records and both
/// reference indexes so uniqueness checks and writes are a single atomic
/// section.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    inner: Arc<RwLock<PaymentsInner>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: Payment) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.by_reference.contains_key(&payment.reference) {
            return Err(HotelError::storage(format!(
                "duplicate payment reference {}",
                payment.reference
            )));
        }
        inner
            .by_reference
            .insert(payment.reference.clone(), payment.id);
        inner
            .by_gateway_reference
            .insert(payment.gateway_reference.clone(), payment.id);
        inner.payments.insert(payment.id, payment);
        Ok(())
    }

    async fn update(&self, payment: Payment) -> Result<()> {
        let mut inner = self.inner.write().await;
        let Some(existing) = inner.payments.get(&payment.id) else {
            return Err(HotelError::not_found("Payment"));
        };
        if existing.reference != payment.reference {
            return Err(HotelError::storage("payment reference is immutable"));
        }
        inner.payments.insert(payment.id, payment);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>> {
        let inner = self.inner.read().await;
        Ok(inner.payments.get(&id).cloned())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_reference
            .get(reference)
            .and_then(|id| inner.payments.get(id))
            .cloned())
    }

    async fn find_by_gateway_reference(&self, reference: &str) -> Result<Option<Payment>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_gateway_reference
            .get(reference)
            .and_then(|id| inner.payments.get(id))
            .cloned())
    }

    async fn list(&self, query: PaymentQuery, page: Page) -> Result<Vec<Payment>> {
        let inner = self.inner.read().await;
        let mut payments: Vec<Payment> = inner
            .payments
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(payments, page))
    }
}

#[derive(Default)]
struct BookingsInner {
    bookings: HashMap<Uuid, Booking>,
    by_payment: HashMap<Uuid, Uuid>,
}

/// In-memory booking store. The payment-to-booking uniqueness lives in the
/// `by_payment` index, checked and written under the same lock as the
/// insert so concurrent derivations collapse to one row.
#[derive(Default, Clone)]
pub struct InMemoryBookingStore {
    inner: Arc<RwLock<BookingsInner>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn create_for_payment(&self, booking: Booking) -> Result<DerivedBooking> {
        let mut inner = self.inner.write().await;
        if let Some(existing_id) = inner.by_payment.get(&booking.payment_id)
            && let Some(existing) = inner.bookings.get(existing_id)
        {
            return Ok(DerivedBooking::Exists(existing.clone()));
        }
        inner.by_payment.insert(booking.payment_id, booking.id);
        inner.bookings.insert(booking.id, booking.clone());
        Ok(DerivedBooking::Created(booking))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>> {
        let inner = self.inner.read().await;
        Ok(inner.bookings.get(&id).cloned())
    }

    async fn find_by_payment(&self, payment_id: Uuid) -> Result<Option<Booking>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_payment
            .get(&payment_id)
            .and_then(|id| inner.bookings.get(id))
            .cloned())
    }

    async fn update(&self, booking: Booking) -> Result<()> {
        let mut inner = self.inner.write().await;
        let Some(existing) = inner.bookings.get(&booking.id) else {
            return Err(HotelError::not_found("Booking"));
        };
        if existing.payment_id != booking.payment_id {
            return Err(HotelError::storage("booking payment link is immutable"));
        }
        inner.bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.bookings.remove(&id) {
            Some(booking) => {
                inner.by_payment.remove(&booking.payment_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self, query: BookingQuery, page: Page) -> Result<Vec<Booking>> {
        let inner = self.inner.read().await;
        let mut bookings: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| query.matches(b))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(bookings, page))
    }
}

#[derive(Default)]
struct RoomsInner {
    rooms: HashMap<Uuid, Room>,
    by_number: HashMap<String, Uuid>,
    by_booking: HashMap<Uuid, Uuid>,
}

/// In-memory room store. Occupancy transitions are compare-and-swap over
/// the room status and the booking index, all under one lock.
#[derive(Default, Clone)]
pub struct InMemoryRoomStore {
    inner: Arc<RwLock<RoomsInner>>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn insert(&self, room: Room) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.by_number.contains_key(&room.room_number) {
            return Err(HotelError::Validation(
                "Room number already exists".to_string(),
            ));
        }
        inner.by_number.insert(room.room_number.clone(), room.id);
        inner.rooms.insert(room.id, room);
        Ok(())
    }

    async fn update(&self, room: Room) -> Result<()> {
        let mut inner = self.inner.write().await;
        let Some(existing) = inner.rooms.get(&room.id) else {
            return Err(HotelError::not_found("Room"));
        };
        if existing.room_number != room.room_number {
            if inner.by_number.contains_key(&room.room_number) {
                return Err(HotelError::Validation(
                    "Room number already exists".to_string(),
                ));
            }
            let previous = existing.room_number.clone();
            inner.by_number.remove(&previous);
            inner.by_number.insert(room.room_number.clone(), room.id);
        }
        inner.rooms.insert(room.id, room);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Room>> {
        let inner = self.inner.read().await;
        Ok(inner.rooms.get(&id).cloned())
    }

    async fn list(&self, query: RoomQuery, page: Page) -> Result<Vec<Room>> {
        let inner = self.inner.read().await;
        let mut rooms: Vec<Room> = inner
            .rooms
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.room_number.cmp(&b.room_number));
        Ok(paginate(rooms, page))
    }

    async fn assign(&self, room_id: Uuid, occupancy: Occupancy) -> Result<Room> {
        let mut inner = self.inner.write().await;

        let Some(room) = inner.rooms.get(&room_id) else {
            return Err(HotelError::not_found("Room"));
        };
        match room.status {
            RoomStatus::Occupied => {
                return Err(HotelError::RoomInUse("Room is already occupied".to_string()));
            }
            RoomStatus::Maintenance => {
                return Err(HotelError::Validation(
                    "Room is under maintenance".to_string(),
                ));
            }
            RoomStatus::Available | RoomStatus::Reserved => {}
        }

        if let Some(booking_id) = occupancy.booking_id
            && let Some(holder_id) = inner.by_booking.get(&booking_id)
            && *holder_id != room_id
        {
            let room_number = inner
                .rooms
                .get(holder_id)
                .map(|holder| holder.room_number.clone())
                .unwrap_or_default();
            return Err(HotelError::DuplicateAssignment {
                booking_reference: occupancy.booking_reference.clone().unwrap_or_default(),
                room_number,
            });
        }

        let mut updated = inner.rooms[&room_id].clone();
        updated.apply_occupancy(&occupancy);
        if let Some(booking_id) = occupancy.booking_id {
            inner.by_booking.insert(booking_id, room_id);
        }
        inner.rooms.insert(room_id, updated.clone());
        Ok(updated)
    }

    async fn release(&self, room_id: Uuid) -> Result<(Room, Option<Uuid>)> {
        let mut inner = self.inner.write().await;

        let Some(room) = inner.rooms.get(&room_id) else {
            return Err(HotelError::not_found("Room"));
        };
        if room.status != RoomStatus::Occupied {
            return Err(HotelError::Validation(
                "Room is not currently occupied".to_string(),
            ));
        }

        let mut updated = room.clone();
        let booking_id = updated.current_booking;
        updated.clear_occupancy();
        if let Some(booking_id) = booking_id {
            inner.by_booking.remove(&booking_id);
        }
        inner.rooms.insert(room_id, updated.clone());
        Ok((updated, booking_id))
    }

    async fn delete_vacant(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        let Some(room) = inner.rooms.get(&id) else {
            return Err(HotelError::not_found("Room"));
        };
        if room.status == RoomStatus::Occupied {
            return Err(HotelError::RoomInUse(
                "Cannot delete an occupied room".to_string(),
            ));
        }
        let room_number = room.room_number.clone();
        inner.rooms.remove(&id);
        inner.by_number.remove(&room_number);
        Ok(())
    }
}
