//! Slot chain validation and slot-grid generation.
//!
//! A reservation owns a run of fixed-duration slots on one desk. The chain
//! must be contiguous (each slot ends exactly where the next begins) and
//! must span the requested window exactly. The grid generator produces the
//! sliding-window inventory the worker maintains.

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::error::CoreError;
use crate::types::Timestamp;

/// A slot's time interval, detached from its database row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSpan {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Validate a candidate slot chain for a booking over `[window_start, window_end)`.
///
/// Sorts `spans` by start time in place, then checks:
///
/// 1. the chain is non-empty,
/// 2. each slot's end equals the next slot's start (no gaps, no overlaps;
///    trivially true for a single slot),
/// 3. the chain covers the window exactly: first start and last end match
///    the window edges.
///
/// A gap inside the window (e.g. a slot in the middle is already booked,
/// so it is missing from the free set) fails the contiguity check and is
/// reported as [`CoreError::NonConsecutiveSlots`]. A chain that is
/// contiguous but stops short of the window edges is reported as
/// [`CoreError::NoAvailableSlots`].
pub fn validate_chain(
    desk_id: i32,
    spans: &mut [SlotSpan],
    window_start: Timestamp,
    window_end: Timestamp,
) -> Result<(), CoreError> {
    if spans.is_empty() {
        return Err(CoreError::NoAvailableSlots { desk_id });
    }

    spans.sort_by_key(|s| s.start);

    for pair in spans.windows(2) {
        if pair[0].end != pair[1].start {
            return Err(CoreError::NonConsecutiveSlots);
        }
    }

    let first = spans[0];
    let last = spans[spans.len() - 1];
    if first.start != window_start || last.end != window_end {
        return Err(CoreError::NoAvailableSlots { desk_id });
    }

    Ok(())
}

/// Configuration for the sliding-window slot inventory.
#[derive(Debug, Clone)]
pub struct SlotCalendar {
    /// How many days of inventory to keep pre-generated, today included.
    pub days_ahead: u32,
    /// Facility opening time.
    pub opening: NaiveTime,
    /// Facility closing time. No slot starts at or after this time.
    pub closing: NaiveTime,
    /// Fixed slot duration in minutes.
    pub slot_minutes: u32,
    /// Desks to generate inventory for.
    pub desk_ids: Vec<i32>,
}

impl Default for SlotCalendar {
    fn default() -> Self {
        Self {
            days_ahead: 5,
            opening: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            closing: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            slot_minutes: 30,
            desk_ids: vec![11, 12, 13, 14, 21, 22, 23, 24, 31, 32, 33, 34],
        }
    }
}

impl SlotCalendar {
    /// The dates covered by the window starting at `today`.
    pub fn window_dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        (0..self.days_ahead as i64)
            .map(|offset| today + Duration::days(offset))
            .collect()
    }

    /// The last date of the window starting at `today` (the day the
    /// midnight run tops up).
    pub fn horizon_date(&self, today: NaiveDate) -> NaiveDate {
        today + Duration::days(self.days_ahead as i64 - 1)
    }

    /// Generate the slot grid for one day: spans from opening to closing at
    /// the configured duration. Times are interpreted as UTC.
    pub fn day_grid(&self, date: NaiveDate) -> Vec<SlotSpan> {
        let duration = Duration::minutes(self.slot_minutes as i64);
        let closing = date.and_time(self.closing).and_utc();

        let mut spans = Vec::new();
        let mut start = date.and_time(self.opening).and_utc();
        while start < closing {
            let end = start + duration;
            spans.push(SlotSpan { start, end });
            start = end;
        }
        spans
    }
}

/// Room numbering convention: desk 11..14 sit in room 1, 21..24 in room 2.
pub fn room_for_desk(desk_id: i32) -> i32 {
    desk_id / 10
}
