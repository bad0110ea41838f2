use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::payment::{Amount, Currency};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    #[default]
    Available,
    Occupied,
    Maintenance,
    Reserved,
}

/// A physical room. When occupied it carries a snapshot of the occupant
/// and, for booked stays, a link to the booking it is serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Uuid,
    pub room_number: String,
    pub room_type: String,
    pub description: Option<String>,
    pub price_per_night: Amount,
    pub currency: Currency,
    pub max_occupancy: u32,
    pub status: RoomStatus,
    pub current_booking: Option<Uuid>,
    pub occupant_name: Option<String>,
    pub occupant_email: Option<String>,
    pub occupant_phone: Option<String>,
    pub check_in_date: Option<DateTime<Utc>>,
    pub check_out_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot applied to a room when it becomes occupied.
///
/// `booking_id`/`booking_reference` are set for booked stays and left
/// empty for walk-ins.
#[derive(Debug, Clone)]
pub struct Occupancy {
    pub booking_id: Option<Uuid>,
    pub booking_reference: Option<String>,
    pub occupant_name: String,
    pub occupant_email: Option<String>,
    pub occupant_phone: Option<String>,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
}

impl Room {
    pub fn apply_occupancy(&mut self, occupancy: &Occupancy) {
        self.current_booking = occupancy.booking_id;
        self.occupant_name = Some(occupancy.occupant_name.clone());
        self.occupant_email = occupancy.occupant_email.clone();
        self.occupant_phone = occupancy.occupant_phone.clone();
        self.check_in_date = Some(occupancy.check_in);
        self.check_out_date = occupancy.check_out;
        self.status = RoomStatus::Occupied;
        self.updated_at = Utc::now();
    }

    /// Clears every occupancy field in one step; a room must never keep a
    /// stale occupant or booking link after checkout.
    pub fn clear_occupancy(&mut self) {
        self.current_booking = None;
        self.occupant_name = None;
        self.occupant_email = None;
        self.occupant_phone = None;
        self.check_in_date = None;
        self.check_out_date = None;
        self.status = RoomStatus::Available;
        self.updated_at = Utc::now();
    }
}
