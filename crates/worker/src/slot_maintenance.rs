//! Sliding-window slot inventory maintenance.
//!
//! Keeps `days_ahead` days of bookable slots pre-generated for every desk
//! and deletes slots whose end time has passed. Runs once at startup (the
//! first interval tick fires immediately) and then daily, so a process
//! that was down over midnight catches up on its next start.
//!
//! Both halves are idempotent: generation checks for existing rows (with
//! an `ON CONFLICT` backstop in the insert), and the reaper's cutoff only
//! moves forward.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use seatwise_core::slots::{room_for_desk, SlotCalendar};
use seatwise_db::models::slot::NewSlot;
use seatwise_db::repositories::SlotRepo;

/// How often the maintenance pass runs.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Build the calendar from environment variables, falling back to the
/// default for anything unset or unparsable.
///
/// | Env Var            | Default                             |
/// |--------------------|-------------------------------------|
/// | `SLOT_DAYS_AHEAD`  | `5`                                 |
/// | `SLOT_OPENING`     | `09:00`                             |
/// | `SLOT_CLOSING`     | `17:00`                             |
/// | `SLOT_MINUTES`     | `30`                                |
/// | `DESK_IDS`         | `11,12,13,14,21,22,23,24,31,32,33,34` |
pub fn calendar_from_env() -> SlotCalendar {
    let mut calendar = SlotCalendar::default();

    if let Some(days) = env_parsed("SLOT_DAYS_AHEAD") {
        calendar.days_ahead = days;
    }
    if let Some(opening) = env_time("SLOT_OPENING") {
        calendar.opening = opening;
    }
    if let Some(closing) = env_time("SLOT_CLOSING") {
        calendar.closing = closing;
    }
    if let Some(minutes) = env_parsed("SLOT_MINUTES") {
        calendar.slot_minutes = minutes;
    }
    if let Ok(raw) = std::env::var("DESK_IDS") {
        let desk_ids: Vec<i32> = raw
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        if !desk_ids.is_empty() {
            calendar.desk_ids = desk_ids;
        }
    }

    calendar
}

fn env_parsed<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|v| v.parse().ok())
}

fn env_time(var: &str) -> Option<chrono::NaiveTime> {
    std::env::var(var)
        .ok()
        .and_then(|v| chrono::NaiveTime::parse_from_str(&v, "%H:%M").ok())
}

/// Run the slot maintenance loop until `cancel` is triggered.
pub async fn run(pool: PgPool, calendar: SlotCalendar, cancel: CancellationToken) {
    tracing::info!(
        days_ahead = calendar.days_ahead,
        desks = calendar.desk_ids.len(),
        interval_secs = MAINTENANCE_INTERVAL.as_secs(),
        "Slot maintenance started"
    );

    let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Slot maintenance stopping");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = maintain(&pool, &calendar).await {
                    tracing::error!(error = %e, "Slot maintenance pass failed");
                }
            }
        }
    }
}

/// One maintenance pass: top up the window, then reap ended slots.
pub async fn maintain(pool: &PgPool, calendar: &SlotCalendar) -> Result<(), sqlx::Error> {
    let now = Utc::now();

    let generated = generate_window(pool, calendar).await?;
    if generated > 0 {
        tracing::info!(generated, "Slot window topped up");
    } else {
        tracing::debug!("Slot window already complete");
    }

    let reaped = SlotRepo::delete_ended_before(pool, now).await?;
    if reaped > 0 {
        tracing::info!(reaped, "Ended slots reaped");
    }

    Ok(())
}

/// Ensure every day in the window has a full grid for every desk.
/// Returns the number of slots inserted.
pub async fn generate_window(pool: &PgPool, calendar: &SlotCalendar) -> Result<u64, sqlx::Error> {
    let today = Utc::now().date_naive();
    let mut missing: Vec<NewSlot> = Vec::new();

    for date in calendar.window_dates(today) {
        for &desk_id in &calendar.desk_ids {
            for span in calendar.day_grid(date) {
                if SlotRepo::exists(pool, desk_id, span.start).await? {
                    continue;
                }
                missing.push(NewSlot {
                    desk_id,
                    room_id: room_for_desk(desk_id),
                    slot_start: span.start,
                    slot_end: span.end,
                });
            }
        }
    }

    SlotRepo::insert_batch(pool, &missing).await
}
