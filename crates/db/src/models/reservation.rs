use seatwise_core::error::CoreError;
use seatwise_core::reservation::ReservationStatus;
use seatwise_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `reservations` table.
///
/// `status` is stored as a lowercase string; use [`Reservation::status`]
/// to get the typed enum.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reservation {
    pub id: DbId,
    pub user_id: DbId,
    pub room_id: i32,
    pub desk_id: i32,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub status: String,
    /// Whole minutes of break budget left. NULL until first check-in.
    pub remaining_break_minutes: Option<i64>,
    pub on_break: bool,
    pub cancellation_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Reservation {
    /// Typed view of the status column.
    pub fn status(&self) -> Result<ReservationStatus, CoreError> {
        ReservationStatus::parse(&self.status)
    }
}

/// DTO for `POST /api/v1/reservations`.
#[derive(Debug, Deserialize)]
pub struct BookReservation {
    pub user_id: DbId,
    pub desk_id: i32,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

/// DTO for `POST /api/v1/reservations/{id}/cancel`.
#[derive(Debug, Deserialize)]
pub struct CancelReservation {
    pub reason: String,
}
