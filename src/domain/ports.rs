use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::booking::{Booking, BookingStatus};
use super::payment::{Amount, Currency, Payment, PaymentMethod, PaymentStatus};
use super::room::{Occupancy, Room, RoomStatus};
use crate::error::Result;

pub type PaymentStoreRef = Arc<dyn PaymentStore>;
pub type BookingStoreRef = Arc<dyn BookingStore>;
pub type RoomStoreRef = Arc<dyn RoomStore>;
pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: usize,
    pub page: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: 10, page: 1 }
    }
}

impl Page {
    pub fn offset(&self) -> usize {
        self.limit * self.page.saturating_sub(1)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaymentQuery {
    pub status: Option<PaymentStatus>,
    pub user_id: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingQuery {
    pub status: Option<BookingStatus>,
    pub user_id: Option<String>,
    pub customer_email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RoomQuery {
    pub status: Option<RoomStatus>,
    pub room_type: Option<String>,
}

impl PaymentQuery {
    /// True when the payment satisfies every set filter.
    pub fn matches(&self, payment: &Payment) -> bool {
        self.status.is_none_or(|status| payment.status == status)
            && self
                .user_id
                .as_ref()
                .is_none_or(|user| payment.user_id.as_ref() == Some(user))
            && self
                .customer_email
                .as_ref()
                .is_none_or(|email| &payment.customer_email == email)
            && self
                .customer_phone
                .as_ref()
                .is_none_or(|phone| &payment.customer_phone == phone)
    }
}

impl BookingQuery {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.status.is_none_or(|status| booking.status == status)
            && self
                .user_id
                .as_ref()
                .is_none_or(|user| booking.user_id.as_ref() == Some(user))
            && self
                .customer_email
                .as_ref()
                .is_none_or(|email| &booking.customer_email == email)
    }
}

impl RoomQuery {
    pub fn matches(&self, room: &Room) -> bool {
        self.status.is_none_or(|status| room.status == status)
            && self
                .room_type
                .as_ref()
                .is_none_or(|room_type| &room.room_type == room_type)
    }
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Rejects duplicate internal references.
    async fn insert(&self, payment: Payment) -> Result<()>;
    async fn update(&self, payment: Payment) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Payment>>;
    /// Lookup in the internal reference space only.
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>>;
    /// Lookup in the gateway reference space only.
    async fn find_by_gateway_reference(&self, reference: &str) -> Result<Option<Payment>>;
    /// Newest first.
    async fn list(&self, query: PaymentQuery, page: Page) -> Result<Vec<Payment>>;
}

/// Outcome of the uniqueness-guarded booking insert.
#[derive(Debug, Clone)]
pub enum DerivedBooking {
    Created(Booking),
    /// A booking for the same payment already existed; this is it.
    Exists(Booking),
}

impl DerivedBooking {
    pub fn into_inner(self) -> Booking {
        match self {
            DerivedBooking::Created(booking) | DerivedBooking::Exists(booking) => booking,
        }
    }
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Inserts unless a booking for the same payment already exists. The
    /// existence check and the write happen under one storage-level guard
    /// so concurrent derivations cannot both succeed.
    async fn create_for_payment(&self, booking: Booking) -> Result<DerivedBooking>;
    async fn get(&self, id: Uuid) -> Result<Option<Booking>>;
    async fn find_by_payment(&self, payment_id: Uuid) -> Result<Option<Booking>>;
    async fn update(&self, booking: Booking) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    /// Newest first.
    async fn list(&self, query: BookingQuery, page: Page) -> Result<Vec<Booking>>;
}

#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Rejects duplicate room numbers.
    async fn insert(&self, room: Room) -> Result<()>;
    /// Rejects updates that would duplicate another room's number.
    async fn update(&self, room: Room) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Room>>;
    async fn list(&self, query: RoomQuery, page: Page) -> Result<Vec<Room>>;
    /// Occupies the room if it is assignable and, when a booking link is
    /// present, no other room already holds that booking. Both checks and
    /// the write are one atomic section.
    async fn assign(&self, room_id: Uuid, occupancy: Occupancy) -> Result<Room>;
    /// Clears occupancy if the room is occupied. Returns the cleared room
    /// and the booking it was serving, if any.
    async fn release(&self, room_id: Uuid) -> Result<(Room, Option<Uuid>)>;
    /// Deletes the room unless it is occupied.
    async fn delete_vacant(&self, id: Uuid) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct GatewayInitialize {
    pub email: String,
    pub amount: Amount,
    pub currency: Currency,
    pub reference: String,
    pub callback_url: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct GatewayAuthorization {
    pub authorization_url: String,
    pub access_code: String,
    /// Reference the provider will use in callbacks; usually echoes ours.
    pub reference: String,
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayChargeStatus {
    Success,
    Failed,
    /// Abandoned, ongoing, reversed — anything not yet settled.
    Other(String),
}

#[derive(Debug, Clone)]
pub struct GatewayVerification {
    pub status: GatewayChargeStatus,
    pub channel: Option<PaymentMethod>,
    pub paid_at: Option<DateTime<Utc>>,
    /// Provider's human-readable diagnostic for the charge.
    pub gateway_response: Option<String>,
    pub raw: serde_json::Value,
}

/// Boundary to the external payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(&self, request: GatewayInitialize) -> Result<GatewayAuthorization>;
    async fn verify(&self, reference: &str) -> Result<GatewayVerification>;
    /// HMAC-SHA512 over the exact raw body, hex-encoded, compared in
    /// constant time against the provider-supplied header value.
    fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> bool;
}
