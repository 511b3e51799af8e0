use seatwise_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `reservation_slots` table: one bookable time unit on one
/// desk. `(desk_id, slot_start)` is unique.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Slot {
    pub id: DbId,
    pub desk_id: i32,
    pub room_id: i32,
    pub slot_start: Timestamp,
    pub slot_end: Timestamp,
    pub is_booked: bool,
    /// Back-reference set by the booking transaction, cleared if the
    /// reservation row is ever deleted.
    pub reservation_id: Option<DbId>,
    pub created_at: Timestamp,
}

/// Insert payload used by the slot generator.
#[derive(Debug, Clone)]
pub struct NewSlot {
    pub desk_id: i32,
    pub room_id: i32,
    pub slot_start: Timestamp,
    pub slot_end: Timestamp,
}
