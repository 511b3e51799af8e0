//! Integration tests for the booking transaction and reservation
//! lifecycle, against a real database:
//! - Booking a contiguous slot chain (slots linked, jobs scheduled)
//! - Rejections: gap in the chain, short chain, unknown user
//! - Concurrent bookings on the same window
//! - Status transitions and their conflicts

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use sqlx::PgPool;

use seatwise_core::error::CoreError;
use seatwise_core::reservation::ReservationStatus;
use seatwise_core::types::Timestamp;
use seatwise_db::error::RepoError;
use seatwise_db::models::reservation::BookReservation;
use seatwise_db::models::scheduled_job::{JOB_CHECK_IN_VERIFICATION, JOB_COMPLETION_VERIFICATION};
use seatwise_db::models::slot::NewSlot;
use seatwise_db::models::user::User;
use seatwise_db::repositories::{JobRepo, ReservationRepo, SlotRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ts(h: u32, m: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
}

async fn seed_user(pool: &PgPool, student_id: &str) -> User {
    UserRepo::create(pool, student_id, "Test User", &format!("{student_id}@example.org"))
        .await
        .unwrap()
}

/// Insert a run of 30-minute slots on one desk starting at `(h, m)`.
async fn seed_slots(pool: &PgPool, desk_id: i32, start: (u32, u32), count: u32) {
    let mut slots = Vec::new();
    let mut slot_start = ts(start.0, start.1);
    for _ in 0..count {
        let slot_end = slot_start + chrono::Duration::minutes(30);
        slots.push(NewSlot {
            desk_id,
            room_id: desk_id / 10,
            slot_start,
            slot_end,
        });
        slot_start = slot_end;
    }
    let inserted = SlotRepo::insert_batch(pool, &slots).await.unwrap();
    assert_eq!(inserted, count as u64);
}

fn booking(user_id: i64, desk_id: i32, start: (u32, u32), end: (u32, u32)) -> BookReservation {
    BookReservation {
        user_id,
        desk_id,
        start_time: ts(start.0, start.1),
        end_time: ts(end.0, end.1),
    }
}

// ---------------------------------------------------------------------------
// Test: successful booking
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_book_contiguous_chain(pool: PgPool) {
    let user = seed_user(&pool, "s1001").await;
    seed_slots(&pool, 11, (9, 0), 4).await;

    let reservation = ReservationRepo::book(&pool, &booking(user.id, 11, (9, 0), (10, 0)))
        .await
        .unwrap();

    assert_eq!(reservation.user_id, user.id);
    assert_eq!(reservation.desk_id, 11);
    assert_eq!(reservation.room_id, 1);
    assert_eq!(reservation.status().unwrap(), ReservationStatus::Pending);
    assert_eq!(reservation.remaining_break_minutes, None);
    assert!(!reservation.on_break);

    // Exactly the two slots inside the window are linked and booked.
    let owned = SlotRepo::list_by_reservation(&pool, reservation.id)
        .await
        .unwrap();
    assert_eq!(owned.len(), 2);
    assert!(owned.iter().all(|s| s.is_booked));
    assert_eq!(owned[0].slot_start, ts(9, 0));
    assert_eq!(owned[1].slot_end, ts(10, 0));

    // Slots outside the window stay free.
    let free = SlotRepo::list_free_by_desk(&pool, 11).await.unwrap();
    assert_eq!(free.len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_book_schedules_verification_jobs(pool: PgPool) {
    let user = seed_user(&pool, "s1002").await;
    seed_slots(&pool, 12, (9, 0), 2).await;

    let reservation = ReservationRepo::book(&pool, &booking(user.id, 12, (9, 0), (10, 0)))
        .await
        .unwrap();

    let jobs = JobRepo::list_by_reservation(&pool, reservation.id)
        .await
        .unwrap();
    assert_eq!(jobs.len(), 2);

    assert_eq!(jobs[0].job_type, JOB_CHECK_IN_VERIFICATION);
    assert_eq!(jobs[0].run_at, reservation.start_time);
    assert_eq!(jobs[0].student_id, "s1002");
    assert_eq!(jobs[0].status, "pending");

    assert_eq!(jobs[1].job_type, JOB_COMPLETION_VERIFICATION);
    assert_eq!(jobs[1].run_at, reservation.end_time);
}

// ---------------------------------------------------------------------------
// Test: rejections
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_book_rejects_window_with_booked_middle_slot(pool: PgPool) {
    let alice = seed_user(&pool, "s2001").await;
    let bob = seed_user(&pool, "s2002").await;
    seed_slots(&pool, 11, (9, 0), 3).await;

    // Bob takes 09:30-10:00, punching a hole in Alice's window.
    ReservationRepo::book(&pool, &booking(bob.id, 11, (9, 30), (10, 0)))
        .await
        .unwrap();

    let err = ReservationRepo::book(&pool, &booking(alice.id, 11, (9, 0), (10, 30)))
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::NonConsecutiveSlots));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_book_rejects_window_with_booked_edge_slot(pool: PgPool) {
    let alice = seed_user(&pool, "s2003").await;
    let bob = seed_user(&pool, "s2004").await;
    seed_slots(&pool, 11, (9, 0), 2).await;

    // Bob takes the tail slot; the free chain stops short of the window.
    ReservationRepo::book(&pool, &booking(bob.id, 11, (9, 30), (10, 0)))
        .await
        .unwrap();

    let err = ReservationRepo::book(&pool, &booking(alice.id, 11, (9, 0), (10, 0)))
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::NoAvailableSlots { desk_id: 11 }));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_book_rejects_empty_window(pool: PgPool) {
    let user = seed_user(&pool, "s2005").await;
    // No slots generated for desk 21.

    let err = ReservationRepo::book(&pool, &booking(user.id, 21, (9, 0), (10, 0)))
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::NoAvailableSlots { desk_id: 21 }));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_book_rejects_unknown_user(pool: PgPool) {
    seed_slots(&pool, 11, (9, 0), 2).await;

    let err = ReservationRepo::book(&pool, &booking(9999, 11, (9, 0), (10, 0)))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        RepoError::Core(CoreError::NotFound { entity: "User", id: 9999 })
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_book_rejects_inverted_window(pool: PgPool) {
    let user = seed_user(&pool, "s2006").await;
    seed_slots(&pool, 11, (9, 0), 2).await;

    let err = ReservationRepo::book(&pool, &booking(user.id, 11, (10, 0), (9, 0)))
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Validation(_)));
}

// ---------------------------------------------------------------------------
// Test: concurrency
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_bookings_exactly_one_wins(
    options: sqlx::pool::PoolOptions<sqlx::Postgres>,
    conn_opts: sqlx::postgres::PgConnectOptions,
) {
    // Two connections so both transactions are genuinely in flight.
    let pool = options
        .max_connections(2)
        .connect_with(conn_opts)
        .await
        .unwrap();

    let alice = seed_user(&pool, "s3001").await;
    let bob = seed_user(&pool, "s3002").await;
    seed_slots(&pool, 11, (9, 0), 2).await;

    let alice_booking = booking(alice.id, 11, (9, 0), (10, 0));
    let bob_booking = booking(bob.id, 11, (9, 0), (10, 0));
    let (a, b) = tokio::join!(
        ReservationRepo::book(&pool, &alice_booking),
        ReservationRepo::book(&pool, &bob_booking),
    );

    // One booking succeeds; the loser re-reads the slots as booked and
    // sees an empty free set (or times out waiting for the lock).
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    let err = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert_matches!(
        err,
        RepoError::Core(
            CoreError::NoAvailableSlots { .. } | CoreError::LockTimeout(_)
        )
    );

    // Both slots belong to exactly one reservation.
    let free = SlotRepo::list_free_by_desk(&pool, 11).await.unwrap();
    assert!(free.is_empty());
}

// ---------------------------------------------------------------------------
// Test: lifecycle transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_cancel_is_terminal(pool: PgPool) {
    let user = seed_user(&pool, "s4001").await;
    seed_slots(&pool, 11, (9, 0), 2).await;

    let reservation = ReservationRepo::book(&pool, &booking(user.id, 11, (9, 0), (10, 0)))
        .await
        .unwrap();

    let cancelled = ReservationRepo::cancel(&pool, reservation.id, "changed my mind")
        .await
        .unwrap();
    assert_eq!(cancelled.status().unwrap(), ReservationStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("changed my mind"));

    // A second cancel conflicts instead of overwriting the reason.
    let err = ReservationRepo::cancel(&pool, reservation.id, "again")
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Conflict(_)));

    let err = ReservationRepo::complete(&pool, reservation.id)
        .await
        .unwrap_err();
    assert_matches!(err, RepoError::Core(CoreError::Conflict(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_complete_from_pending(pool: PgPool) {
    let user = seed_user(&pool, "s4002").await;
    seed_slots(&pool, 11, (9, 0), 2).await;

    let reservation = ReservationRepo::book(&pool, &booking(user.id, 11, (9, 0), (10, 0)))
        .await
        .unwrap();

    let completed = ReservationRepo::complete(&pool, reservation.id).await.unwrap();
    assert_eq!(completed.status().unwrap(), ReservationStatus::Completed);
}

// ---------------------------------------------------------------------------
// Test: lookups used by scan routing and the room view
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_find_active_by_student(pool: PgPool) {
    let user = seed_user(&pool, "s5001").await;
    seed_slots(&pool, 11, (9, 0), 2).await;

    let reservation = ReservationRepo::book(&pool, &booking(user.id, 11, (9, 0), (10, 0)))
        .await
        .unwrap();

    // Inside the window.
    let found = ReservationRepo::find_active_by_student(&pool, "s5001", ts(9, 15))
        .await
        .unwrap();
    assert_eq!(found.unwrap().id, reservation.id);

    // Outside the window (end is exclusive).
    let found = ReservationRepo::find_active_by_student(&pool, "s5001", ts(10, 0))
        .await
        .unwrap();
    assert!(found.is_none());

    // Unknown student.
    let found = ReservationRepo::find_active_by_student(&pool, "s9999", ts(9, 15))
        .await
        .unwrap();
    assert!(found.is_none());

    // Cancelled reservations are not scan targets.
    ReservationRepo::cancel(&pool, reservation.id, "no longer needed")
        .await
        .unwrap();
    let found = ReservationRepo::find_active_by_student(&pool, "s5001", ts(9, 15))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_active_by_room(pool: PgPool) {
    let alice = seed_user(&pool, "s5002").await;
    let bob = seed_user(&pool, "s5003").await;
    seed_slots(&pool, 11, (9, 0), 2).await;
    seed_slots(&pool, 12, (9, 0), 2).await;
    seed_slots(&pool, 21, (9, 0), 2).await;

    let in_room_1 = ReservationRepo::book(&pool, &booking(alice.id, 11, (9, 0), (10, 0)))
        .await
        .unwrap();
    ReservationRepo::book(&pool, &booking(bob.id, 21, (9, 0), (10, 0)))
        .await
        .unwrap();

    let active = ReservationRepo::list_active_by_room(&pool, 1, ts(9, 15))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, in_room_1.id);

    let active = ReservationRepo::list_active_by_room(&pool, 1, ts(11, 0))
        .await
        .unwrap();
    assert!(active.is_empty());
}
