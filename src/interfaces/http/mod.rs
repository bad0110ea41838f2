pub mod bookings;
pub mod error;
pub mod payments;
pub mod rooms;
pub mod state;

pub use state::AppState;

use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::domain::ports::Page;

/// `{message, data}` envelope used by every data-carrying response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: &'static str,
    pub data: T,
}

/// Message-only envelope for acknowledgements.
#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub message: &'static str,
}

pub(crate) fn to_page(limit: Option<usize>, page: Option<usize>) -> Page {
    Page {
        limit: limit.unwrap_or(10).clamp(1, 100),
        page: page.unwrap_or(1).max(1),
    }
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub fn router(state: AppState) -> Router {
    let payments = Router::new()
        .route("/initialize", post(payments::initialize))
        .route("/verify/:reference", get(payments::verify))
        .route("/webhook", post(payments::webhook))
        .route("/", get(payments::list_for_customer))
        .route("/admin/all", get(payments::list_all))
        .route("/:payment_id", get(payments::get_by_id));

    let rooms = Router::new()
        .route("/", get(rooms::list).post(rooms::create))
        .route(
            "/:room_id",
            get(rooms::get_by_id)
                .patch(rooms::update)
                .delete(rooms::remove),
        )
        .route("/:room_id/assign", post(rooms::assign))
        .route("/:room_id/assign-manual", post(rooms::assign_manual))
        .route("/:room_id/unassign", post(rooms::unassign));

    let bookings = Router::new()
        .route("/", get(bookings::list))
        .route(
            "/:booking_id",
            get(bookings::get_by_id).delete(bookings::remove),
        )
        .route("/:booking_id/status", patch(bookings::update_status));

    Router::new()
        .route("/health", get(health))
        .nest("/v1/payments", payments)
        .nest("/v1/rooms", rooms)
        .nest("/v1/bookings", bookings)
        .with_state(state)
}
