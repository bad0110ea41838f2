#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use hortencia::application::bookings::BookingService;
use hortencia::application::payments::{InitializePaymentRequest, PaymentService};
use hortencia::application::rooms::{NewRoom, RoomService};
use hortencia::config::{AppConfig, PaystackConfig};
use hortencia::domain::booking::{Booking, BookingStatus};
use hortencia::domain::payment::{Amount, Currency, PaymentMetadata, PaymentMethod};
use hortencia::domain::ports::{
    BookingStore, DerivedBooking, GatewayAuthorization, GatewayChargeStatus, GatewayInitialize,
    GatewayVerification, PaymentGateway, PaymentGatewayRef,
};
use hortencia::domain::room::Room;
use hortencia::error::{HotelError, Result};
use hortencia::infrastructure::in_memory::{
    InMemoryBookingStore, InMemoryPaymentStore, InMemoryRoomStore,
};
use hortencia::infrastructure::paystack;
use hortencia::interfaces::http::AppState;

pub const TEST_SECRET: &str = "sk_test_webhook_secret";

/// What the mock gateway answers to the next `verify` call.
#[derive(Debug, Clone)]
pub enum VerifyScript {
    Success {
        paid_at: Option<DateTime<Utc>>,
        channel: Option<PaymentMethod>,
    },
    Failed {
        reason: String,
    },
    Pending,
    Error(String),
    Timeout,
}

/// Scriptable stand-in for the payment provider.
pub struct MockGateway {
    /// Reference the gateway echoes back from `initialize`; `None` echoes
    /// the request's own reference.
    pub issued_reference: Option<String>,
    pub fail_initialize: Option<String>,
    pub verify_script: Mutex<VerifyScript>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            issued_reference: None,
            fail_initialize: None,
            verify_script: Mutex::new(VerifyScript::Pending),
        }
    }
}

impl MockGateway {
    pub fn issuing(reference: &str) -> Self {
        Self {
            issued_reference: Some(reference.to_string()),
            ..Self::default()
        }
    }

    pub fn script_verify(&self, script: VerifyScript) {
        *self.verify_script.lock().unwrap() = script;
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn initialize(&self, request: GatewayInitialize) -> Result<GatewayAuthorization> {
        if let Some(message) = &self.fail_initialize {
            return Err(HotelError::GatewayRequest(message.clone()));
        }
        let reference = self
            .issued_reference
            .clone()
            .unwrap_or_else(|| request.reference.clone());
        Ok(GatewayAuthorization {
            authorization_url: format!("https://checkout.example.com/{reference}"),
            access_code: "ACCESS_CODE".to_string(),
            reference: reference.clone(),
            raw: serde_json::json!({
                "authorization_url": format!("https://checkout.example.com/{reference}"),
                "access_code": "ACCESS_CODE",
                "reference": reference,
            }),
        })
    }

    async fn verify(&self, _reference: &str) -> Result<GatewayVerification> {
        match self.verify_script.lock().unwrap().clone() {
            VerifyScript::Success { paid_at, channel } => Ok(GatewayVerification {
                status: GatewayChargeStatus::Success,
                channel,
                paid_at,
                gateway_response: Some("Approved".to_string()),
                raw: serde_json::json!({"status": "success"}),
            }),
            VerifyScript::Failed { reason } => Ok(GatewayVerification {
                status: GatewayChargeStatus::Failed,
                channel: Some(PaymentMethod::Card),
                paid_at: None,
                gateway_response: Some(reason),
                raw: serde_json::json!({"status": "failed"}),
            }),
            VerifyScript::Pending => Ok(GatewayVerification {
                status: GatewayChargeStatus::Other("ongoing".to_string()),
                channel: None,
                paid_at: None,
                gateway_response: None,
                raw: serde_json::json!({"status": "ongoing"}),
            }),
            VerifyScript::Error(message) => Err(HotelError::GatewayRequest(message)),
            VerifyScript::Timeout => Err(HotelError::GatewayTimeout),
        }
    }

    fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> bool {
        paystack::verify_signature(TEST_SECRET, body, signature)
    }
}

pub struct TestApp {
    pub payments: Arc<PaymentService>,
    pub bookings: Arc<BookingService>,
    pub rooms: Arc<RoomService>,
    pub payment_store: Arc<InMemoryPaymentStore>,
    pub booking_store: Arc<InMemoryBookingStore>,
    pub room_store: Arc<InMemoryRoomStore>,
    pub gateway: Arc<MockGateway>,
}

impl TestApp {
    pub fn state(&self) -> AppState {
        AppState {
            payments: self.payments.clone(),
            bookings: self.bookings.clone(),
            rooms: self.rooms.clone(),
        }
    }
}

pub fn test_app(gateway: MockGateway) -> TestApp {
    let payment_store = Arc::new(InMemoryPaymentStore::new());
    let booking_store = Arc::new(InMemoryBookingStore::new());
    let room_store = Arc::new(InMemoryRoomStore::new());
    let gateway = Arc::new(gateway);
    let gateway_ref: PaymentGatewayRef = gateway.clone();

    let config = AppConfig {
        client_url: Some("https://hotel.example.com".to_string()),
        paystack: PaystackConfig::new(TEST_SECRET),
    };

    TestApp {
        payments: Arc::new(PaymentService::new(
            payment_store.clone(),
            booking_store.clone(),
            gateway_ref,
            &config,
        )),
        bookings: Arc::new(BookingService::new(booking_store.clone())),
        rooms: Arc::new(RoomService::new(room_store.clone(), booking_store.clone())),
        payment_store,
        booking_store,
        room_store,
        gateway,
    }
}

/// Stay request for the canonical two-night scenario.
pub fn stay_metadata() -> PaymentMetadata {
    serde_json::from_value(serde_json::json!({
        "checkIn": "2024-02-01",
        "checkOut": "2024-02-03",
        "roomType": "Deluxe"
    }))
    .unwrap()
}

pub fn initialize_request(metadata: PaymentMetadata) -> InitializePaymentRequest {
    InitializePaymentRequest {
        amount: dec!(5000),
        email: "guest@example.com".to_string(),
        name: "Guest Example".to_string(),
        phone_number: "+2348000000000".to_string(),
        currency: None,
        description: None,
        metadata,
    }
}

/// Signs a webhook body the way the provider would.
pub fn signed_webhook(body: &serde_json::Value) -> (Vec<u8>, String) {
    let bytes = serde_json::to_vec(body).unwrap();
    let signature = paystack::sign(TEST_SECRET, &bytes).unwrap();
    (bytes, signature)
}

/// Seeds a booking directly, bypassing the payment pipeline.
pub async fn seed_booking(
    store: &InMemoryBookingStore,
    status: BookingStatus,
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
) -> Booking {
    let now = Utc::now();
    let booking = Booking {
        id: Uuid::new_v4(),
        user_id: None,
        payment_id: Uuid::new_v4(),
        booking_reference: format!("BOOK_{}_{}", now.timestamp_millis(), &Uuid::new_v4().simple().to_string()[..8].to_uppercase()),
        customer_email: "guest@example.com".to_string(),
        customer_name: "Guest Example".to_string(),
        customer_phone: "+2348000000000".to_string(),
        hotel_id: "HORTENCIA_HOTEL".to_string(),
        room_id: None,
        room_type: "Deluxe".to_string(),
        check_in,
        check_out,
        number_of_guests: 2,
        number_of_nights: 2,
        total_amount: Amount::new(dec!(5000)).unwrap(),
        currency: Currency::Ngn,
        status,
        payment_reference: "HORTENCIA_PAYMENT_1_AB12CD34".to_string(),
        metadata: PaymentMetadata::default(),
        created_at: now,
        updated_at: now,
    };
    match store.create_for_payment(booking).await.unwrap() {
        DerivedBooking::Created(booking) => booking,
        DerivedBooking::Exists(_) => unreachable!("payment id is fresh"),
    }
}

pub async fn seed_confirmed_booking(store: &InMemoryBookingStore) -> Booking {
    seed_booking(
        store,
        BookingStatus::Confirmed,
        Utc::now() + Duration::days(1),
        Utc::now() + Duration::days(3),
    )
    .await
}

pub async fn seed_room(service: &RoomService, number: &str) -> Room {
    service
        .create(NewRoom {
            room_number: number.to_string(),
            room_type: "Deluxe".to_string(),
            description: None,
            price_per_night: dec!(25000),
            currency: None,
            max_occupancy: Some(2),
        })
        .await
        .unwrap()
}
