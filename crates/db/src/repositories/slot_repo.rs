use sqlx::{PgPool, QueryBuilder};

use seatwise_core::types::Timestamp;

use crate::models::slot::{NewSlot, Slot};

const SLOT_COLUMNS: &str = "\
    id, desk_id, room_id, slot_start, slot_end, is_booked, reservation_id, created_at";

/// Inventory operations on the `reservation_slots` table.
///
/// Slots are created by the generator, mutated only inside the booking
/// transaction (see `ReservationRepo::book`), and deleted by the reaper.
pub struct SlotRepo;

impl SlotRepo {
    /// Idempotency check used by the generator before inserting a slot.
    pub async fn exists(
        pool: &PgPool,
        desk_id: i32,
        slot_start: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM reservation_slots WHERE desk_id = $1 AND slot_start = $2)",
        )
        .bind(desk_id)
        .bind(slot_start)
        .fetch_one(pool)
        .await
    }

    /// Batch-insert generated slots. `ON CONFLICT DO NOTHING` backstops the
    /// existence check so two overlapping generator runs cannot error.
    /// Returns the number of rows actually inserted.
    pub async fn insert_batch(pool: &PgPool, slots: &[NewSlot]) -> Result<u64, sqlx::Error> {
        if slots.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::new(
            "INSERT INTO reservation_slots (desk_id, room_id, slot_start, slot_end) ",
        );
        builder.push_values(slots, |mut row, slot| {
            row.push_bind(slot.desk_id)
                .push_bind(slot.room_id)
                .push_bind(slot.slot_start)
                .push_bind(slot.slot_end);
        });
        builder.push(" ON CONFLICT (desk_id, slot_start) DO NOTHING");

        let result = builder.build().execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Free slots for one desk, ordered by start time.
    pub async fn list_free_by_desk(pool: &PgPool, desk_id: i32) -> Result<Vec<Slot>, sqlx::Error> {
        let query = format!(
            "SELECT {SLOT_COLUMNS} FROM reservation_slots \
             WHERE desk_id = $1 AND NOT is_booked \
             ORDER BY slot_start"
        );
        sqlx::query_as::<_, Slot>(&query)
            .bind(desk_id)
            .fetch_all(pool)
            .await
    }

    /// Free slots for every desk in a room, ordered by desk then start time.
    pub async fn list_free_by_room(pool: &PgPool, room_id: i32) -> Result<Vec<Slot>, sqlx::Error> {
        let query = format!(
            "SELECT {SLOT_COLUMNS} FROM reservation_slots \
             WHERE room_id = $1 AND NOT is_booked \
             ORDER BY desk_id, slot_start"
        );
        sqlx::query_as::<_, Slot>(&query)
            .bind(room_id)
            .fetch_all(pool)
            .await
    }

    /// Slots owned by a reservation, ordered by start time.
    pub async fn list_by_reservation(
        pool: &PgPool,
        reservation_id: i64,
    ) -> Result<Vec<Slot>, sqlx::Error> {
        let query = format!(
            "SELECT {SLOT_COLUMNS} FROM reservation_slots \
             WHERE reservation_id = $1 \
             ORDER BY slot_start"
        );
        sqlx::query_as::<_, Slot>(&query)
            .bind(reservation_id)
            .fetch_all(pool)
            .await
    }

    /// Reaper: delete every slot that ended before `cutoff`, booked or not.
    /// Reservations keep their own copy of the time range, so no history is
    /// lost. Returns the number of rows deleted.
    pub async fn delete_ended_before(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reservation_slots WHERE slot_end < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Total slot count for a desk. Test/diagnostic helper.
    pub async fn count_by_desk(pool: &PgPool, desk_id: i32) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reservation_slots WHERE desk_id = $1")
            .bind(desk_id)
            .fetch_one(pool)
            .await
    }
}
