//! Integration tests for the break-monitor persistence primitives,
//! against a real database:
//! - Arrival confirms the reservation and records the granted budget
//! - Break start/end round-trips the decreased budget
//! - Budget exhaustion cancels with the recorded reason

use chrono::{TimeZone, Utc};
use sqlx::PgPool;

use seatwise_core::reservation::{ReservationStatus, REASON_BREAK_EXCEEDED};
use seatwise_core::types::Timestamp;
use seatwise_db::models::reservation::{BookReservation, Reservation};
use seatwise_db::models::slot::NewSlot;
use seatwise_db::repositories::{ReservationRepo, SlotRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ts(h: u32, m: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
}

/// Seed a user, two slots on desk 11 and a 09:00-10:00 reservation.
async fn seed_reservation(pool: &PgPool, student_id: &str) -> Reservation {
    let user = UserRepo::create(
        pool,
        student_id,
        "Test User",
        &format!("{student_id}@example.org"),
    )
    .await
    .unwrap();

    let mut slots = Vec::new();
    let mut slot_start = ts(9, 0);
    for _ in 0..2 {
        let slot_end = slot_start + chrono::Duration::minutes(30);
        slots.push(NewSlot {
            desk_id: 11,
            room_id: 1,
            slot_start,
            slot_end,
        });
        slot_start = slot_end;
    }
    SlotRepo::insert_batch(pool, &slots).await.unwrap();

    ReservationRepo::book(
        pool,
        &BookReservation {
            user_id: user.id,
            desk_id: 11,
            start_time: ts(9, 0),
            end_time: ts(10, 0),
        },
    )
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// Test: arrival
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_record_arrival_confirms_and_sets_budget(pool: PgPool) {
    let reservation = seed_reservation(&pool, "s6001").await;
    assert_eq!(reservation.remaining_break_minutes, None);

    let mut tx = pool.begin().await.unwrap();
    let locked = ReservationRepo::lock_for_update(&mut tx, reservation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(locked.status().unwrap(), ReservationStatus::Pending);

    let updated = ReservationRepo::record_arrival(&mut tx, reservation.id, 30)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(updated.status().unwrap(), ReservationStatus::Confirmed);
    assert_eq!(updated.remaining_break_minutes, Some(30));
    assert!(!updated.on_break);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_record_arrival_persists_caller_budget(pool: PgPool) {
    // A repeat scan confirms with the budget already on the row; the
    // primitive must write exactly what it is given, not a fresh maximum.
    let reservation = seed_reservation(&pool, "s6002").await;

    let mut tx = pool.begin().await.unwrap();
    ReservationRepo::record_arrival(&mut tx, reservation.id, 18)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let found = ReservationRepo::find_by_id(&pool, reservation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.remaining_break_minutes, Some(18));
}

// ---------------------------------------------------------------------------
// Test: break start/end round-trip
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_break_round_trip_persists_decreased_budget(pool: PgPool) {
    let reservation = seed_reservation(&pool, "s6003").await;

    let mut tx = pool.begin().await.unwrap();
    ReservationRepo::record_arrival(&mut tx, reservation.id, 30)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    // Check out: on a break with the full budget.
    let mut tx = pool.begin().await.unwrap();
    let away = ReservationRepo::record_break_start(&mut tx, reservation.id, 30)
        .await
        .unwrap();
    tx.commit().await.unwrap();
    assert!(away.on_break);
    assert_eq!(away.remaining_break_minutes, Some(30));

    // Check back in 12 minutes later: 18 minutes left.
    let mut tx = pool.begin().await.unwrap();
    let back = ReservationRepo::record_break_end(&mut tx, reservation.id, 18)
        .await
        .unwrap();
    tx.commit().await.unwrap();
    assert!(!back.on_break);
    assert_eq!(back.remaining_break_minutes, Some(18));

    // The decreased budget survives independent reads.
    let found = ReservationRepo::find_by_id(&pool, reservation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.remaining_break_minutes, Some(18));
    assert_eq!(found.status().unwrap(), ReservationStatus::Confirmed);
}

// ---------------------------------------------------------------------------
// Test: budget exhaustion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_record_cancellation_ends_the_reservation(pool: PgPool) {
    let reservation = seed_reservation(&pool, "s6004").await;

    let mut tx = pool.begin().await.unwrap();
    ReservationRepo::record_break_start(&mut tx, reservation.id, 30)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    let cancelled =
        ReservationRepo::record_cancellation(&mut tx, reservation.id, REASON_BREAK_EXCEEDED)
            .await
            .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(cancelled.status().unwrap(), ReservationStatus::Cancelled);
    assert_eq!(
        cancelled.cancellation_reason.as_deref(),
        Some(REASON_BREAK_EXCEEDED)
    );
    assert!(!cancelled.on_break);

    // A cancelled reservation is no longer a scan target.
    let found = ReservationRepo::find_active_by_student(&pool, "s6004", ts(9, 15))
        .await
        .unwrap();
    assert!(found.is_none());
}
