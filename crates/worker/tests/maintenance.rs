//! Integration tests for the slot maintenance pass:
//! - Window generation fills the full grid once and is re-runnable
//! - The reaper half removes ended slots without touching the window

use chrono::{Duration, NaiveTime, Utc};
use sqlx::PgPool;

use seatwise_core::slots::SlotCalendar;
use seatwise_db::models::slot::NewSlot;
use seatwise_db::repositories::SlotRepo;
use seatwise_worker::slot_maintenance;

/// Small calendar so the pass stays fast: 2 days, 2 desks, 4 slots/day.
fn test_calendar() -> SlotCalendar {
    SlotCalendar {
        days_ahead: 2,
        opening: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        closing: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        slot_minutes: 30,
        desk_ids: vec![11, 21],
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_generate_window_fills_grid_once(pool: PgPool) {
    let calendar = test_calendar();

    let generated = slot_maintenance::generate_window(&pool, &calendar)
        .await
        .unwrap();
    // 2 days x 2 desks x 4 slots.
    assert_eq!(generated, 16);

    // Re-running generates nothing new.
    let again = slot_maintenance::generate_window(&pool, &calendar)
        .await
        .unwrap();
    assert_eq!(again, 0);

    assert_eq!(SlotRepo::count_by_desk(&pool, 11).await.unwrap(), 8);
    assert_eq!(SlotRepo::count_by_desk(&pool, 21).await.unwrap(), 8);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_generate_window_tops_up_partial_inventory(pool: PgPool) {
    let calendar = test_calendar();
    let today = Utc::now().date_naive();

    // Pre-seed desk 11's grid for today only.
    let mut seeded = Vec::new();
    for span in calendar.day_grid(today) {
        seeded.push(NewSlot {
            desk_id: 11,
            room_id: 1,
            slot_start: span.start,
            slot_end: span.end,
        });
    }
    SlotRepo::insert_batch(&pool, &seeded).await.unwrap();

    let generated = slot_maintenance::generate_window(&pool, &calendar)
        .await
        .unwrap();
    // Everything except the 4 pre-seeded slots.
    assert_eq!(generated, 12);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_maintain_reaps_ended_slots(pool: PgPool) {
    let calendar = test_calendar();

    // A slot that ended yesterday.
    let yesterday = Utc::now() - Duration::days(1);
    SlotRepo::insert_batch(
        &pool,
        &[NewSlot {
            desk_id: 11,
            room_id: 1,
            slot_start: yesterday - Duration::minutes(30),
            slot_end: yesterday,
        }],
    )
    .await
    .unwrap();

    slot_maintenance::maintain(&pool, &calendar).await.unwrap();

    // The stale slot is gone; today's window may keep slots that have
    // already ended only if they end after the pass ran, so just assert
    // nothing older than now survives.
    let now = Utc::now();
    let remaining = SlotRepo::list_free_by_desk(&pool, 11).await.unwrap();
    assert!(remaining.iter().all(|s| s.slot_end >= now - Duration::minutes(1)));
    assert!(!SlotRepo::exists(&pool, 11, yesterday - Duration::minutes(30))
        .await
        .unwrap());
}
