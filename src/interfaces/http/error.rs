use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::error::HotelError;

/// `{code, message}` body attached to every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

fn classify(err: &HotelError) -> (StatusCode, &'static str) {
    match err {
        HotelError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR"),
        HotelError::GatewayRequest(_) => (StatusCode::BAD_REQUEST, "GATEWAY_REQUEST_FAILED"),
        HotelError::GatewayTimeout => (StatusCode::GATEWAY_TIMEOUT, "GATEWAY_TIMEOUT"),
        HotelError::PaymentInitialization(_) => {
            (StatusCode::BAD_REQUEST, "PAYMENT_INITIALIZATION_FAILED")
        }
        HotelError::PaymentVerification(_) => {
            (StatusCode::BAD_REQUEST, "PAYMENT_VERIFICATION_FAILED")
        }
        HotelError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        HotelError::InvalidSignature => (StatusCode::UNAUTHORIZED, "INVALID_SIGNATURE"),
        HotelError::DuplicateAssignment { .. } => (StatusCode::BAD_REQUEST, "DUPLICATE_ASSIGNMENT"),
        HotelError::RoomInUse(_) => (StatusCode::BAD_REQUEST, "ROOM_IN_USE"),
        HotelError::StaleBooking => (StatusCode::BAD_REQUEST, "STALE_BOOKING"),
        HotelError::PartialAssignment(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "PARTIAL_ASSIGNMENT")
        }
        HotelError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        HotelError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
    }
}

impl IntoResponse for HotelError {
    fn into_response(self) -> Response {
        let (status, code) = classify(&self);
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = %status, code, message, "request failed");
        }

        (status, Json(ErrorBody { code, message })).into_response()
    }
}
