use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::{to_page, ApiMessage, ApiResponse, AppState};
use crate::application::rooms::{NewRoom, RoomUpdate, WalkInOccupant};
use crate::domain::payment::{parse_flexible_date, Currency};
use crate::domain::room::{Room, RoomStatus};
use crate::domain::ports::RoomQuery;
use crate::error::HotelError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomBody {
    pub room_number: String,
    pub room_type: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_per_night: Decimal,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub max_occupancy: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateRoomBody {
    pub room_number: Option<String>,
    pub room_type: Option<String>,
    pub description: Option<String>,
    pub price_per_night: Option<Decimal>,
    pub currency: Option<Currency>,
    pub max_occupancy: Option<u32>,
    pub status: Option<RoomStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBody {
    pub booking_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAssignBody {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub check_in: Option<String>,
    #[serde(default)]
    pub check_out: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomListParams {
    pub status: Option<RoomStatus>,
    pub room_type: Option<String>,
    pub limit: Option<usize>,
    pub page: Option<usize>,
}

fn parse_optional_date(value: Option<String>) -> Result<Option<DateTime<Utc>>, HotelError> {
    value
        .map(|raw| parse_flexible_date(&raw).map_err(HotelError::Validation))
        .transpose()
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateRoomBody>,
) -> Result<(StatusCode, Json<ApiResponse<Room>>), HotelError> {
    let room = state
        .rooms
        .create(NewRoom {
            room_number: body.room_number,
            room_type: body.room_type,
            description: body.description,
            price_per_night: body.price_per_night,
            currency: body.currency,
            max_occupancy: body.max_occupancy,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            message: "Room created successfully",
            data: room,
        }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<RoomListParams>,
) -> Result<Json<ApiResponse<Vec<Room>>>, HotelError> {
    let page = to_page(params.limit, params.page);
    let rooms = state
        .rooms
        .list(
            RoomQuery {
                status: params.status,
                room_type: params.room_type,
            },
            page,
        )
        .await?;
    Ok(Json(ApiResponse {
        message: "Rooms retrieved successfully",
        data: rooms,
    }))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Room>>, HotelError> {
    let room = state.rooms.get(room_id).await?;
    Ok(Json(ApiResponse {
        message: "Room retrieved successfully",
        data: room,
    }))
}

pub async fn update(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Json(body): Json<UpdateRoomBody>,
) -> Result<Json<ApiResponse<Room>>, HotelError> {
    let room = state
        .rooms
        .update(
            room_id,
            RoomUpdate {
                room_number: body.room_number,
                room_type: body.room_type,
                description: body.description,
                price_per_night: body.price_per_night,
                currency: body.currency,
                max_occupancy: body.max_occupancy,
                status: body.status,
            },
        )
        .await?;
    Ok(Json(ApiResponse {
        message: "Room updated successfully",
        data: room,
    }))
}

pub async fn assign(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Json(body): Json<AssignBody>,
) -> Result<Json<ApiResponse<Room>>, HotelError> {
    let room = state
        .rooms
        .assign_to_booking(room_id, body.booking_id)
        .await?;
    Ok(Json(ApiResponse {
        message: "Room assigned successfully",
        data: room,
    }))
}

pub async fn assign_manual(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Json(body): Json<ManualAssignBody>,
) -> Result<Json<ApiResponse<Room>>, HotelError> {
    let occupant = WalkInOccupant {
        name: body.name,
        email: body.email,
        phone: body.phone,
        check_in: parse_optional_date(body.check_in)?,
        check_out: parse_optional_date(body.check_out)?,
    };
    let room = state.rooms.assign_manual(room_id, occupant).await?;
    Ok(Json(ApiResponse {
        message: "Room assigned successfully",
        data: room,
    }))
}

pub async fn unassign(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Room>>, HotelError> {
    let room = state.rooms.unassign(room_id).await?;
    Ok(Json(ApiResponse {
        message: "Room checked out successfully",
        data: room,
    }))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<ApiMessage>, HotelError> {
    state.rooms.delete(room_id).await?;
    Ok(Json(ApiMessage {
        message: "Room deleted successfully",
    }))
}
