//! Reservation persistence, including the booking transaction.
//!
//! Booking is the only operation that touches slot rows and reservation
//! rows together; everything it does happens inside one transaction under
//! a desk-range row lock so no concurrent booking can observe a
//! half-updated slot chain.

use sqlx::{PgPool, Postgres, Transaction};

use seatwise_core::error::CoreError;
use seatwise_core::reservation::ReservationStatus;
use seatwise_core::slots::{self, SlotSpan};
use seatwise_core::types::{DbId, Timestamp};

use crate::error::{map_lock_timeout, RepoError};
use crate::models::reservation::{BookReservation, Reservation};
use crate::models::scheduled_job::JobType;
use crate::models::user::User;

const RESERVATION_COLUMNS: &str = "\
    id, user_id, room_id, desk_id, start_time, end_time, status, \
    remaining_break_minutes, on_break, cancellation_reason, created_at, updated_at";

/// How long a booking waits for the desk's slot rows before giving up.
const SLOT_LOCK_TIMEOUT: &str = "3s";

/// Row shape for the locked slot read inside the booking transaction.
#[derive(sqlx::FromRow)]
struct LockedSlot {
    id: DbId,
    room_id: i32,
    slot_start: Timestamp,
    slot_end: Timestamp,
}

/// Reservation CRUD plus the booking transaction.
pub struct ReservationRepo;

impl ReservationRepo {
    /// Book a contiguous run of free slots on one desk.
    ///
    /// Inside a single transaction:
    ///
    /// 1. `SET LOCAL lock_timeout` so a contended desk fails fast
    ///    (surfaced as [`CoreError::LockTimeout`], retryable) instead of
    ///    blocking indefinitely.
    /// 2. `SELECT ... FOR UPDATE` the free slots inside the window. Any
    ///    concurrent booking on an overlapping range blocks here; once the
    ///    winner commits, the loser re-reads the rows as booked and they
    ///    drop out of the free set.
    /// 3. Validate the chain (contiguous, spans the window exactly).
    /// 4. Insert the reservation as `pending`, mark and link the slots.
    /// 5. Enqueue the two deferred verification jobs (start and end time).
    ///
    /// Any validation failure rolls the transaction back, which releases
    /// the lock before the error is returned.
    pub async fn book(pool: &PgPool, input: &BookReservation) -> Result<Reservation, RepoError> {
        if input.start_time >= input.end_time {
            return Err(CoreError::Validation(
                "start_time must be before end_time".into(),
            )
            .into());
        }

        let user = Self::require_user(pool, input.user_id).await?;

        let mut tx = pool.begin().await.map_err(RepoError::Database)?;

        sqlx::query(&format!("SET LOCAL lock_timeout = '{SLOT_LOCK_TIMEOUT}'"))
            .execute(&mut *tx)
            .await
            .map_err(RepoError::Database)?;

        let locked: Vec<LockedSlot> = sqlx::query_as(
            "SELECT id, room_id, slot_start, slot_end FROM reservation_slots \
             WHERE desk_id = $1 AND NOT is_booked \
               AND slot_start >= $2 AND slot_end <= $3 \
             ORDER BY slot_start \
             FOR UPDATE",
        )
        .bind(input.desk_id)
        .bind(input.start_time)
        .bind(input.end_time)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_lock_timeout(e, "desk slot range"))?;

        let mut spans: Vec<SlotSpan> = locked
            .iter()
            .map(|s| SlotSpan {
                start: s.slot_start,
                end: s.slot_end,
            })
            .collect();
        slots::validate_chain(input.desk_id, &mut spans, input.start_time, input.end_time)?;

        let room_id = locked[0].room_id;

        let query = format!(
            "INSERT INTO reservations (user_id, room_id, desk_id, start_time, end_time, status) \
             VALUES ($1, $2, $3, $4, $5, 'pending') \
             RETURNING {RESERVATION_COLUMNS}"
        );
        let reservation = sqlx::query_as::<_, Reservation>(&query)
            .bind(input.user_id)
            .bind(room_id)
            .bind(input.desk_id)
            .bind(input.start_time)
            .bind(input.end_time)
            .fetch_one(&mut *tx)
            .await
            .map_err(RepoError::Database)?;

        let slot_ids: Vec<DbId> = locked.iter().map(|s| s.id).collect();
        sqlx::query(
            "UPDATE reservation_slots SET is_booked = TRUE, reservation_id = $1 \
             WHERE id = ANY($2)",
        )
        .bind(reservation.id)
        .bind(&slot_ids)
        .execute(&mut *tx)
        .await
        .map_err(RepoError::Database)?;

        for (job_type, run_at) in [
            (JobType::CheckInVerification, input.start_time),
            (JobType::CompletionVerification, input.end_time),
        ] {
            sqlx::query(
                "INSERT INTO scheduled_jobs (job_type, reservation_id, student_id, run_at) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(job_type.as_str())
            .bind(reservation.id)
            .bind(&user.student_id)
            .bind(run_at)
            .execute(&mut *tx)
            .await
            .map_err(RepoError::Database)?;
        }

        tx.commit().await.map_err(RepoError::Database)?;
        Ok(reservation)
    }

    /// Cancel a reservation, recording the reason.
    ///
    /// Terminal reservations (already cancelled or completed) are a
    /// conflict, not a silent overwrite; idempotent callers check status
    /// first and treat the conflict as a no-op.
    pub async fn cancel(
        pool: &PgPool,
        id: DbId,
        reason: &str,
    ) -> Result<Reservation, RepoError> {
        let mut tx = pool.begin().await.map_err(RepoError::Database)?;
        let reservation = Self::transition_locked(&mut tx, id, ReservationStatus::Cancelled, Some(reason)).await?;
        tx.commit().await.map_err(RepoError::Database)?;
        Ok(reservation)
    }

    /// Mark a reservation completed.
    pub async fn complete(pool: &PgPool, id: DbId) -> Result<Reservation, RepoError> {
        let mut tx = pool.begin().await.map_err(RepoError::Database)?;
        let reservation =
            Self::transition_locked(&mut tx, id, ReservationStatus::Completed, None).await?;
        tx.commit().await.map_err(RepoError::Database)?;
        Ok(reservation)
    }

    /// Find a reservation by primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1");
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All reservations for a user, most recent first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        let query = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE user_id = $1 \
             ORDER BY start_time DESC"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Reservations currently in progress in a room: the window contains
    /// `now` and the status is not terminal.
    pub async fn list_active_by_room(
        pool: &PgPool,
        room_id: i32,
        now: Timestamp,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        let query = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE room_id = $1 \
               AND status IN ('pending', 'confirmed') \
               AND start_time <= $2 AND end_time > $2 \
             ORDER BY desk_id"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(room_id)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// The student's reservation whose window contains `now`, if any.
    /// Drives scan routing: scans without one get a "no reservation" reply.
    pub async fn find_active_by_student(
        pool: &PgPool,
        student_id: &str,
        now: Timestamp,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM reservations AS r \
             INNER JOIN users AS u ON r.user_id = u.id \
             WHERE u.student_id = $1 \
               AND r.status IN ('pending', 'confirmed') \
               AND r.start_time <= $2 AND r.end_time > $2 \
             ORDER BY r.start_time \
             LIMIT 1",
            prefixed_columns("r")
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(student_id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Break-monitor primitives (per-reservation serialization)
    // -----------------------------------------------------------------------
    //
    // Check-in and check-out for one reservation must not interleave, so
    // the break monitor opens a transaction and locks the row first. These
    // helpers operate on that transaction.

    /// Lock the reservation row for the rest of the transaction.
    pub async fn lock_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        let query =
            format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Check-in with no outstanding break: confirm the reservation and
    /// persist the budget the caller decided on. The full budget is only
    /// granted at the very first check-in; repeat scans pass the recorded
    /// budget back in unchanged.
    pub async fn record_arrival(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        budget_minutes: i64,
    ) -> Result<Reservation, sqlx::Error> {
        let query = format!(
            "UPDATE reservations \
             SET status = 'confirmed', remaining_break_minutes = $2, on_break = FALSE, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {RESERVATION_COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .bind(budget_minutes)
            .fetch_one(&mut **tx)
            .await
    }

    /// Check-out: the user is now away, with `remaining_minutes` of budget.
    pub async fn record_break_start(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        remaining_minutes: i64,
    ) -> Result<Reservation, sqlx::Error> {
        let query = format!(
            "UPDATE reservations \
             SET on_break = TRUE, remaining_break_minutes = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING {RESERVATION_COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .bind(remaining_minutes)
            .fetch_one(&mut **tx)
            .await
    }

    /// Return from a break within budget: persist what is left.
    pub async fn record_break_end(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        remaining_minutes: i64,
    ) -> Result<Reservation, sqlx::Error> {
        let query = format!(
            "UPDATE reservations \
             SET on_break = FALSE, remaining_break_minutes = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING {RESERVATION_COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .bind(remaining_minutes)
            .fetch_one(&mut **tx)
            .await
    }

    /// Cancel inside an already-open transaction (break budget exhausted).
    pub async fn record_cancellation(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        reason: &str,
    ) -> Result<Reservation, sqlx::Error> {
        let query = format!(
            "UPDATE reservations \
             SET status = 'cancelled', cancellation_reason = $2, on_break = FALSE, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {RESERVATION_COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .bind(reason)
            .fetch_one(&mut **tx)
            .await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn require_user(pool: &PgPool, user_id: DbId) -> Result<User, RepoError> {
        super::UserRepo::find_by_id(pool, user_id)
            .await
            .map_err(RepoError::Database)?
            .ok_or_else(|| {
                RepoError::Core(CoreError::NotFound {
                    entity: "User",
                    id: user_id,
                })
            })
    }

    /// Lock the row, check the state machine, apply the transition.
    async fn transition_locked(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        to: ReservationStatus,
        reason: Option<&str>,
    ) -> Result<Reservation, RepoError> {
        let current = Self::lock_for_update(tx, id)
            .await
            .map_err(RepoError::Database)?
            .ok_or(RepoError::Core(CoreError::NotFound {
                entity: "Reservation",
                id,
            }))?;

        let status = current.status()?;
        if !status.can_transition(to) {
            return Err(RepoError::Core(CoreError::Conflict(format!(
                "Reservation {id} is {status} and cannot become {to}"
            ))));
        }

        let query = format!(
            "UPDATE reservations \
             SET status = $2, cancellation_reason = COALESCE($3, cancellation_reason), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {RESERVATION_COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .bind(to.as_str())
            .bind(reason)
            .fetch_one(&mut **tx)
            .await
            .map_err(RepoError::Database)
    }
}

/// `RESERVATION_COLUMNS` with a table alias prefix, for joined queries.
fn prefixed_columns(alias: &str) -> String {
    RESERVATION_COLUMNS
        .split(", ")
        .map(|col| format!("{alias}.{}", col.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
