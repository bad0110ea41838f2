use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::{to_page, ApiMessage, ApiResponse, AppState};
use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::ports::BookingQuery;
use crate::error::HotelError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingListParams {
    pub status: Option<BookingStatus>,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub limit: Option<usize>,
    pub page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: BookingStatus,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<BookingListParams>,
) -> Result<Json<ApiResponse<Vec<Booking>>>, HotelError> {
    let page = to_page(params.limit, params.page);
    let bookings = state
        .bookings
        .list(
            BookingQuery {
                status: params.status,
                user_id: params.user_id,
                customer_email: params.email,
            },
            page,
        )
        .await?;
    Ok(Json(ApiResponse {
        message: "Bookings retrieved successfully",
        data: bookings,
    }))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, HotelError> {
    let booking = state.bookings.get(booking_id).await?;
    Ok(Json(ApiResponse {
        message: "Booking retrieved successfully",
        data: booking,
    }))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<ApiResponse<Booking>>, HotelError> {
    let booking = state
        .bookings
        .update_status(booking_id, body.status)
        .await?;
    Ok(Json(ApiResponse {
        message: "Booking status updated successfully",
        data: booking,
    }))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<ApiMessage>, HotelError> {
    state.bookings.delete(booking_id).await?;
    Ok(Json(ApiMessage {
        message: "Booking deleted successfully",
    }))
}
