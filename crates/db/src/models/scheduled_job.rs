use seatwise_core::error::CoreError;
use seatwise_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Job type string: fires at reservation start, cancels no-shows.
pub const JOB_CHECK_IN_VERIFICATION: &str = "check_in_verification";
/// Job type string: fires at reservation end, completes the reservation.
pub const JOB_COMPLETION_VERIFICATION: &str = "completion_verification";

/// The two deferred verification callbacks scheduled at booking time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    CheckInVerification,
    CompletionVerification,
}

impl JobType {
    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckInVerification => JOB_CHECK_IN_VERIFICATION,
            Self::CompletionVerification => JOB_COMPLETION_VERIFICATION,
        }
    }

    /// Parse from a string, returning an error for unknown types.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            JOB_CHECK_IN_VERIFICATION => Ok(Self::CheckInVerification),
            JOB_COMPLETION_VERIFICATION => Ok(Self::CompletionVerification),
            other => Err(CoreError::Validation(format!(
                "Unknown scheduled job type: '{other}'"
            ))),
        }
    }
}

/// A row from the `scheduled_jobs` table: a durable fire-once callback.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScheduledJob {
    pub id: DbId,
    pub job_type: String,
    pub reservation_id: DbId,
    pub student_id: String,
    pub run_at: Timestamp,
    pub status: String,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}
