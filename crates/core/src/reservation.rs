//! Reservation status enum and state machine.
//!
//! Statuses are stored as lowercase strings in the `reservations` table.
//! Transitions are driven by the booking engine (creation only), the break
//! monitor, and the lifecycle verifier; nothing else mutates status.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Cancellation reason recorded when a break runs over budget.
pub const REASON_BREAK_EXCEEDED: &str = "break time exceeded";

/// Cancellation reason recorded when the user never checked in.
pub const REASON_NO_SHOW: &str = "did not check in on time";

/// Lifecycle status of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Created by a successful booking; the user has not checked in yet.
    Pending,
    /// The user checked in on time.
    Confirmed,
    /// Terminal: cancelled by the user, the verifier, or the break monitor.
    Cancelled,
    /// Terminal: the reservation window ended normally.
    Completed,
}

impl ReservationStatus {
    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Parse from the database string, rejecting unknown values.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(CoreError::Validation(format!(
                "Unknown reservation status: '{other}'"
            ))),
        }
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// Valid target statuses reachable from `self`.
    pub fn valid_transitions(&self) -> &'static [ReservationStatus] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled, Self::Completed],
            Self::Confirmed => &[Self::Cancelled, Self::Completed],
            Self::Cancelled | Self::Completed => &[],
        }
    }

    /// Check whether a transition to `to` is allowed.
    pub fn can_transition(&self, to: ReservationStatus) -> bool {
        self.valid_transitions().contains(&to)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
