use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, Options, WriteBatch, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::booking::Booking;
use crate::domain::payment::Payment;
use crate::domain::ports::{
    BookingQuery, BookingStore, DerivedBooking, Page, PaymentQuery, PaymentStore, RoomQuery,
    RoomStore,
};
use crate::domain::room::{Occupancy, Room, RoomStatus};
use crate::error::{HotelError, Result};

/// Column family per entity, plus index column families that back the
/// uniqueness and lookup guarantees.
pub const CF_PAYMENTS: &str = "payments";
pub const CF_PAYMENT_REFS: &str = "payment_refs";
pub const CF_PAYMENT_GATEWAY_REFS: &str = "payment_gateway_refs";
pub const CF_BOOKINGS: &str = "bookings";
pub const CF_BOOKING_BY_PAYMENT: &str = "booking_by_payment";
pub const CF_ROOMS: &str = "rooms";
pub const CF_ROOM_BY_NUMBER: &str = "room_by_number";
pub const CF_ROOM_BY_BOOKING: &str = "room_by_booking";

const ALL_CFS: [&str; 8] = [
    CF_PAYMENTS,
    CF_PAYMENT_REFS,
    CF_PAYMENT_GATEWAY_REFS,
    CF_BOOKINGS,
    CF_BOOKING_BY_PAYMENT,
    CF_ROOMS,
    CF_ROOM_BY_NUMBER,
    CF_ROOM_BY_BOOKING,
];

/// Persistent store backed by RocksDB, implementing all three store ports
/// on one handle (`Clone` shares the underlying `Arc<DB>`).
///
/// RocksDB has no cross-key transactions in this setup, so every
/// check-then-write section takes `write_guard` first; within one process
/// that gives the same atomicity as the in-memory store's lock.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_guard: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates the database, ensuring every column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&opts, path, descriptors).map_err(HotelError::storage)?;

        Ok(Self {
            db: Arc::new(db),
            write_guard: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| HotelError::storage(format!("{name} column family not found")))
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key).map_err(HotelError::storage)? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).map_err(HotelError::storage)?,
            )),
            None => Ok(None),
        }
    }

    fn get_uuid(&self, cf_name: &str, key: &[u8]) -> Result<Option<Uuid>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key).map_err(HotelError::storage)? {
            Some(bytes) => Ok(Some(
                Uuid::from_slice(&bytes).map_err(HotelError::storage)?,
            )),
            None => Ok(None),
        }
    }

    fn scan_json<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, bytes) = item.map_err(HotelError::storage)?;
            values.push(serde_json::from_slice(&bytes).map_err(HotelError::storage)?);
        }
        Ok(values)
    }

    fn batch_put_json<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        cf_name: &str,
        key: &[u8],
        value: &T,
    ) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value).map_err(HotelError::storage)?;
        batch.put_cf(cf, key, bytes);
        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db.write(batch).map_err(HotelError::storage)
    }
}

fn page_slice<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset())
        .take(page.limit)
        .collect()
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn insert(&self, payment: Payment) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        if self
            .get_uuid(CF_PAYMENT_REFS, payment.reference.as_bytes())?
            .is_some()
        {
            return Err(HotelError::storage(format!(
                "duplicate payment reference {}",
                payment.reference
            )));
        }

        let mut batch = WriteBatch::default();
        self.batch_put_json(&mut batch, CF_PAYMENTS, payment.id.as_bytes(), &payment)?;
        batch.put_cf(
            self.cf(CF_PAYMENT_REFS)?,
            payment.reference.as_bytes(),
            payment.id.as_bytes(),
        );
        batch.put_cf(
            self.cf(CF_PAYMENT_GATEWAY_REFS)?,
            payment.gateway_reference.as_bytes(),
            payment.id.as_bytes(),
        );
        self.write(batch)
    }

    async fn update(&self, payment: Payment) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        let Some(existing) = self.get_json::<Payment>(CF_PAYMENTS, payment.id.as_bytes())? else {
            return Err(HotelError::not_found("Payment"));
        };
        if existing.reference != payment.reference {
            return Err(HotelError::storage("payment reference is immutable"));
        }

        let mut batch = WriteBatch::default();
        self.batch_put_json(&mut batch, CF_PAYMENTS, payment.id.as_bytes(), &payment)?;
        self.write(batch)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>> {
        self.get_json(CF_PAYMENTS, id.as_bytes())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>> {
        match self.get_uuid(CF_PAYMENT_REFS, reference.as_bytes())? {
            Some(id) => self.get_json(CF_PAYMENTS, id.as_bytes()),
            None => Ok(None),
        }
    }

    async fn find_by_gateway_reference(&self, reference: &str) -> Result<Option<Payment>> {
        match self.get_uuid(CF_PAYMENT_GATEWAY_REFS, reference.as_bytes())? {
            Some(id) => self.get_json(CF_PAYMENTS, id.as_bytes()),
            None => Ok(None),
        }
    }

    async fn list(&self, query: PaymentQuery, page: Page) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .scan_json::<Payment>(CF_PAYMENTS)?
            .into_iter()
            .filter(|p| query.matches(p))
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_slice(payments, page))
    }
}

#[async_trait]
impl BookingStore for RocksDBStore {
    async fn create_for_payment(&self, booking: Booking) -> Result<DerivedBooking> {
        let _guard = self.write_guard.lock().await;
        if let Some(existing_id) =
            self.get_uuid(CF_BOOKING_BY_PAYMENT, booking.payment_id.as_bytes())?
            && let Some(existing) = self.get_json::<Booking>(CF_BOOKINGS, existing_id.as_bytes())?
        {
            return Ok(DerivedBooking::Exists(existing));
        }

        let mut batch = WriteBatch::default();
        self.batch_put_json(&mut batch, CF_BOOKINGS, booking.id.as_bytes(), &booking)?;
        batch.put_cf(
            self.cf(CF_BOOKING_BY_PAYMENT)?,
            booking.payment_id.as_bytes(),
            booking.id.as_bytes(),
        );
        self.write(batch)?;
        Ok(DerivedBooking::Created(booking))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>> {
        self.get_json(CF_BOOKINGS, id.as_bytes())
    }

    async fn find_by_payment(&self, payment_id: Uuid) -> Result<Option<Booking>> {
        match self.get_uuid(CF_BOOKING_BY_PAYMENT, payment_id.as_bytes())? {
            Some(id) => self.get_json(CF_BOOKINGS, id.as_bytes()),
            None => Ok(None),
        }
    }

    async fn update(&self, booking: Booking) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        let Some(existing) = self.get_json::<Booking>(CF_BOOKINGS, booking.id.as_bytes())? else {
            return Err(HotelError::not_found("Booking"));
        };
        if existing.payment_id != booking.payment_id {
            return Err(HotelError::storage("booking payment link is immutable"));
        }

        let mut batch = WriteBatch::default();
        self.batch_put_json(&mut batch, CF_BOOKINGS, booking.id.as_bytes(), &booking)?;
        self.write(batch)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let _guard = self.write_guard.lock().await;
        let Some(booking) = self.get_json::<Booking>(CF_BOOKINGS, id.as_bytes())? else {
            return Ok(false);
        };

        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf(CF_BOOKINGS)?, id.as_bytes());
        batch.delete_cf(
            self.cf(CF_BOOKING_BY_PAYMENT)?,
            booking.payment_id.as_bytes(),
        );
        self.write(batch)?;
        Ok(true)
    }

    async fn list(&self, query: BookingQuery, page: Page) -> Result<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .scan_json::<Booking>(CF_BOOKINGS)?
            .into_iter()
            .filter(|b| query.matches(b))
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_slice(bookings, page))
    }
}

#[async_trait]
impl RoomStore for RocksDBStore {
    async fn insert(&self, room: Room) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        if self
            .get_uuid(CF_ROOM_BY_NUMBER, room.room_number.as_bytes())?
            .is_some()
        {
            return Err(HotelError::Validation(
                "Room number already exists".to_string(),
            ));
        }

        let mut batch = WriteBatch::default();
        self.batch_put_json(&mut batch, CF_ROOMS, room.id.as_bytes(), &room)?;
        batch.put_cf(
            self.cf(CF_ROOM_BY_NUMBER)?,
            room.room_number.as_bytes(),
            room.id.as_bytes(),
        );
        self.write(batch)
    }

    async fn update(&self, room: Room) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        let Some(existing) = self.get_json::<Room>(CF_ROOMS, room.id.as_bytes())? else {
            return Err(HotelError::not_found("Room"));
        };

        let mut batch = WriteBatch::default();
        if existing.room_number != room.room_number {
            if self
                .get_uuid(CF_ROOM_BY_NUMBER, room.room_number.as_bytes())?
                .is_some()
            {
                return Err(HotelError::Validation(
                    "Room number already exists".to_string(),
                ));
            }
            batch.delete_cf(self.cf(CF_ROOM_BY_NUMBER)?, existing.room_number.as_bytes());
            batch.put_cf(
                self.cf(CF_ROOM_BY_NUMBER)?,
                room.room_number.as_bytes(),
                room.id.as_bytes(),
            );
        }
        self.batch_put_json(&mut batch, CF_ROOMS, room.id.as_bytes(), &room)?;
        self.write(batch)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Room>> {
        self.get_json(CF_ROOMS, id.as_bytes())
    }

    async fn list(&self, query: RoomQuery, page: Page) -> Result<Vec<Room>> {
        let mut rooms: Vec<Room> = self
            .scan_json::<Room>(CF_ROOMS)?
            .into_iter()
            .filter(|r| query.matches(r))
            .collect();
        rooms.sort_by(|a, b| a.room_number.cmp(&b.room_number));
        Ok(page_slice(rooms, page))
    }

    async fn assign(&self, room_id: Uuid, occupancy: Occupancy) -> Result<Room> {
        let _guard = self.write_guard.lock().await;
        let Some(mut room) = self.get_json::<Room>(CF_ROOMS, room_id.as_bytes())? else {
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
            && let Some(holder_id) = self.get_uuid(CF_ROOM_BY_BOOKING, booking_id.as_bytes())?
            && holder_id != room_id
        {
            let room_number = self
                .get_json::<Room>(CF_ROOMS, holder_id.as_bytes())?
                .map(|holder| holder.room_number)
                .unwrap_or_default();
            return Err(HotelError::DuplicateAssignment {
                booking_reference: occupancy.booking_reference.clone().unwrap_or_default(),
                room_number,
            });
        }

        room.apply_occupancy(&occupancy);

        let mut batch = WriteBatch::default();
        self.batch_put_json(&mut batch, CF_ROOMS, room.id.as_bytes(), &room)?;
        if let Some(booking_id) = occupancy.booking_id {
            batch.put_cf(
                self.cf(CF_ROOM_BY_BOOKING)?,
                booking_id.as_bytes(),
                room_id.as_bytes(),
            );
        }
        self.write(batch)?;
        Ok(room)
    }

    async fn release(&self, room_id: Uuid) -> Result<(Room, Option<Uuid>)> {
        let _guard = self.write_guard.lock().await;
        let Some(mut room) = self.get_json::<Room>(CF_ROOMS, room_id.as_bytes())? else {
            return Err(HotelError::not_found("Room"));
        };
        if room.status != RoomStatus::Occupied {
            return Err(HotelError::Validation(
                "Room is not currently occupied".to_string(),
            ));
        }

        let booking_id = room.current_booking;
        room.clear_occupancy();

        let mut batch = WriteBatch::default();
        self.batch_put_json(&mut batch, CF_ROOMS, room.id.as_bytes(), &room)?;
        if let Some(booking_id) = booking_id {
            batch.delete_cf(self.cf(CF_ROOM_BY_BOOKING)?, booking_id.as_bytes());
        }
        self.write(batch)?;
        Ok((room, booking_id))
    }

    async fn delete_vacant(&self, id: Uuid) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        let Some(room) = self.get_json::<Room>(CF_ROOMS, id.as_bytes())? else {
            return Err(HotelError::not_found("Room"));
        };
        if room.status == RoomStatus::Occupied {
            return Err(HotelError::RoomInUse(
                "Cannot delete an occupied room".to_string(),
            ));
        }

        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf(CF_ROOMS)?, id.as_bytes());
        batch.delete_cf(self.cf(CF_ROOM_BY_NUMBER)?, room.room_number.as_bytes());
        self.write(batch)
    }
}
