//! Integration tests for the scheduled-job dispatcher primitives:
//! - Claiming only due, pending jobs
//! - `SKIP LOCKED` between two concurrent claimers
//! - Outcome recording

use chrono::{TimeZone, Utc};
use sqlx::PgPool;

use seatwise_core::types::Timestamp;
use seatwise_db::models::reservation::BookReservation;
use seatwise_db::models::slot::NewSlot;
use seatwise_db::repositories::{JobRepo, ReservationRepo, SlotRepo, UserRepo};

fn ts(h: u32, m: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
}

/// Book a 09:00-10:00 reservation, which schedules a check-in job at
/// 09:00 and a completion job at 10:00.
async fn seed_booking(pool: &PgPool) -> i64 {
    let user = UserRepo::create(pool, "s7001", "Test User", "s7001@example.org")
        .await
        .unwrap();
    SlotRepo::insert_batch(
        pool,
        &[
            NewSlot {
                desk_id: 11,
                room_id: 1,
                slot_start: ts(9, 0),
                slot_end: ts(9, 30),
            },
            NewSlot {
                desk_id: 11,
                room_id: 1,
                slot_start: ts(9, 30),
                slot_end: ts(10, 0),
            },
        ],
    )
    .await
    .unwrap();

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
    .id
}

#[sqlx::test(migrations = "./migrations")]
async fn test_claim_due_respects_run_at(pool: PgPool) {
    seed_booking(&pool).await;

    // Before the start time nothing is due.
    let mut tx = pool.begin().await.unwrap();
    let due = JobRepo::claim_due(&mut tx, ts(8, 59), 10).await.unwrap();
    assert!(due.is_empty());
    tx.rollback().await.unwrap();

    // At the start time only the check-in job is due.
    let mut tx = pool.begin().await.unwrap();
    let due = JobRepo::claim_due(&mut tx, ts(9, 0), 10).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].run_at, ts(9, 0));
    tx.rollback().await.unwrap();

    // After the end time both are due, ordered by run_at.
    let mut tx = pool.begin().await.unwrap();
    let due = JobRepo::claim_due(&mut tx, ts(10, 0), 10).await.unwrap();
    assert_eq!(due.len(), 2);
    assert!(due[0].run_at <= due[1].run_at);
    tx.rollback().await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
async fn test_claimed_jobs_are_skipped_by_second_claimer(
    options: sqlx::pool::PoolOptions<sqlx::Postgres>,
    conn_opts: sqlx::postgres::PgConnectOptions,
) {
    // Two connections so both claim transactions are open at once.
    let pool = options
        .max_connections(2)
        .connect_with(conn_opts)
        .await
        .unwrap();

    seed_booking(&pool).await;

    let mut first = pool.begin().await.unwrap();
    let claimed = JobRepo::claim_due(&mut first, ts(10, 0), 10).await.unwrap();
    assert_eq!(claimed.len(), 2);

    // While the first transaction holds the rows, a second claimer skips
    // them instead of blocking.
    let mut second = pool.begin().await.unwrap();
    let also_claimed = JobRepo::claim_due(&mut second, ts(10, 0), 10).await.unwrap();
    assert!(also_claimed.is_empty());
    second.rollback().await.unwrap();

    // Rolling back the first claim returns the jobs to the queue.
    first.rollback().await.unwrap();
    let mut retry = pool.begin().await.unwrap();
    let reclaimed = JobRepo::claim_due(&mut retry, ts(10, 0), 10).await.unwrap();
    assert_eq!(reclaimed.len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_outcomes_remove_jobs_from_the_queue(pool: PgPool) {
    let reservation_id = seed_booking(&pool).await;

    let mut tx = pool.begin().await.unwrap();
    let due = JobRepo::claim_due(&mut tx, ts(10, 0), 10).await.unwrap();
    JobRepo::mark_done(&mut tx, due[0].id).await.unwrap();
    JobRepo::mark_failed(&mut tx, due[1].id, "reservation lookup failed")
        .await
        .unwrap();
    tx.commit().await.unwrap();

    // Neither job is claimable again.
    let mut tx = pool.begin().await.unwrap();
    let due = JobRepo::claim_due(&mut tx, ts(10, 0), 10).await.unwrap();
    assert!(due.is_empty());
    tx.rollback().await.unwrap();

    let jobs = JobRepo::list_by_reservation(&pool, reservation_id).await.unwrap();
    assert_eq!(jobs[0].status, "done");
    assert!(jobs[0].completed_at.is_some());
    assert_eq!(jobs[1].status, "failed");
    assert_eq!(jobs[1].last_error.as_deref(), Some("reservation lookup failed"));
}
