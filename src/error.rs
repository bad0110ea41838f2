use thiserror::Error;

pub type Result<T> = std::result::Result<T, HotelError>;

#[derive(Error, Debug)]
pub enum HotelError {
    /// Missing or unusable gateway credentials. Not retryable.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The payment provider rejected the call.
    #[error("Gateway request failed: {0}")]
    GatewayRequest(String),
    /// The gateway call timed out before the provider answered. The outcome
    /// is ambiguous, so the caller must not settle the payment.
    #[error("Gateway request timed out")]
    GatewayTimeout,
    #[error("Payment initialization failed: {0}")]
    PaymentInitialization(String),
    #[error("Payment verification failed: {0}")]
    PaymentVerification(String),
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("Invalid webhook signature")]
    InvalidSignature,
    #[error("Booking {booking_reference} is already assigned to room {room_number}")]
    DuplicateAssignment {
        booking_reference: String,
        room_number: String,
    },
    #[error("{0}")]
    RoomInUse(String),
    #[error("Booking check-out date has passed")]
    StaleBooking,
    /// The room write committed but the paired booking write did not.
    /// Requires operator remediation.
    #[error("Partial assignment: {0}")]
    PartialAssignment(String),
    #[error("{0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl HotelError {
    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }
}
