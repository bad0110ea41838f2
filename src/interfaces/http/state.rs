use std::sync::Arc;

use crate::application::bookings::BookingService;
use crate::application::payments::PaymentService;
use crate::application::rooms::RoomService;

/// Shared handles to the application services, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub payments: Arc<PaymentService>,
    pub bookings: Arc<BookingService>,
    pub rooms: Arc<RoomService>,
}
