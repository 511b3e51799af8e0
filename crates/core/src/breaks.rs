//! Break budget arithmetic and scan decision logic.
//!
//! The durable `remaining_break_minutes` column holds whole minutes; the
//! break start timestamp lives only in the ephemeral marker. The two are
//! never conflated in one field.

use crate::types::Timestamp;

/// Default maximum break budget in minutes, granted at first check-in.
pub const DEFAULT_MAX_BREAK_MINUTES: i64 = 30;

/// Whole minutes elapsed between break start and check-in time.
///
/// Sub-minute remainders are dropped, so a checkout followed immediately by
/// a check-in costs zero budget. A clock skew that puts `checked_in_at`
/// before `break_start` also counts as zero.
pub fn elapsed_minutes(break_start: Timestamp, checked_in_at: Timestamp) -> i64 {
    (checked_in_at - break_start).num_minutes().max(0)
}

/// Budget left after a break: previous remaining minus elapsed, clamped to
/// zero. The TTL on the marker enforces the hard limit; this computation
/// only reports what is left once the user has returned in time.
pub fn remaining_after_break(previous_remaining: i64, elapsed: i64) -> i64 {
    (previous_remaining - elapsed).max(0)
}

/// What an ENTER scan should do to the reservation, decided from the
/// durable row and the marker lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInAction {
    /// First check-in ever: confirm and grant the full budget.
    Arrival { budget_minutes: i64 },
    /// Repeat scan with no outstanding break: confirm, budget unchanged.
    /// The budget only decreases once granted; a scan never refills it.
    Reconfirm { remaining_minutes: i64 },
    /// Returned from a break in time: charge the elapsed minutes.
    EndBreak { remaining_minutes: i64 },
    /// The marker expired while the user was away; the break ran over.
    BreakExpired,
}

/// Decide the ENTER scan outcome.
///
/// `remaining_minutes` is NULL until the first check-in, which is what
/// distinguishes an arrival from a repeat scan. `break_start` is the
/// marker's payload, or `None` when the marker has expired; it is only
/// consulted while `on_break` is set.
pub fn check_in_action(
    on_break: bool,
    remaining_minutes: Option<i64>,
    break_start: Option<Timestamp>,
    checked_in_at: Timestamp,
    max_minutes: i64,
) -> CheckInAction {
    if !on_break {
        return match remaining_minutes {
            None => CheckInAction::Arrival {
                budget_minutes: max_minutes,
            },
            Some(remaining) => CheckInAction::Reconfirm {
                remaining_minutes: remaining,
            },
        };
    }

    match break_start {
        None => CheckInAction::BreakExpired,
        Some(start) => {
            let elapsed = elapsed_minutes(start, checked_in_at);
            let remaining =
                remaining_after_break(remaining_minutes.unwrap_or(max_minutes), elapsed);
            CheckInAction::EndBreak {
                remaining_minutes: remaining,
            }
        }
    }
}

/// What an EXIT scan should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutAction {
    /// Start a break: write a marker expiring after `budget_minutes`.
    StartBreak { budget_minutes: i64 },
    /// Already on a break: report the budget, touch nothing. Rewriting the
    /// marker would restart its TTL and push the deadline out.
    AlreadyOnBreak { remaining_minutes: i64 },
}

/// Decide the EXIT scan outcome. A reservation that never checked in gets
/// the full budget for its first break.
pub fn check_out_action(
    on_break: bool,
    remaining_minutes: Option<i64>,
    max_minutes: i64,
) -> CheckOutAction {
    let budget = remaining_minutes.unwrap_or(max_minutes);
    if on_break {
        CheckOutAction::AlreadyOnBreak {
            remaining_minutes: budget,
        }
    } else {
        CheckOutAction::StartBreak {
            budget_minutes: budget,
        }
    }
}
