//! Deferred reservation verification.
//!
//! The booking transaction schedules two durable jobs per reservation: one
//! at the start time (cancel no-shows) and one at the end time (complete
//! whatever is still open). This module polls the `scheduled_jobs` table,
//! claims due jobs with `FOR UPDATE SKIP LOCKED`, and executes them.
//!
//! Delivery is at-least-once: a job claimed by a worker that dies returns
//! to `pending` when its transaction rolls back. Every callback is
//! therefore written to be idempotent: a reservation that already reached
//! the intended state (or a terminal one) is a no-op, including when a
//! concurrent scan races the callback and wins.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use seatwise_cache::error::CacheError;
use seatwise_cache::presence::PresenceSet;
use seatwise_core::error::CoreError;
use seatwise_core::reservation::{ReservationStatus, REASON_NO_SHOW};
use seatwise_db::error::RepoError;
use seatwise_db::models::reservation::Reservation;
use seatwise_db::models::scheduled_job::{JobType, ScheduledJob};
use seatwise_db::repositories::{JobRepo, ReservationRepo};

/// How often the dispatcher polls for due jobs.
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Maximum jobs claimed per poll.
const CLAIM_BATCH: i64 = 50;

/// Error type for one job execution.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl From<RepoError> for VerifyError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Core(e) => VerifyError::Core(e),
            RepoError::Database(e) => VerifyError::Database(e),
        }
    }
}

/// Run the verification dispatcher loop until `cancel` is triggered.
pub async fn run(pool: PgPool, presence: PresenceSet, cancel: CancellationToken) {
    tracing::info!(
        poll_secs = POLL_INTERVAL.as_secs(),
        batch = CLAIM_BATCH,
        "Verification dispatcher started"
    );

    let mut interval = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Verification dispatcher stopping");
                break;
            }
            _ = interval.tick() => {
                match run_once(&pool, &presence).await {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!(claimed = n, "Verification batch processed"),
                    Err(e) => tracing::error!(error = %e, "Verification poll failed"),
                }
            }
        }
    }
}

/// One poll: claim due jobs, execute each, record the outcome.
///
/// The claim transaction stays open while callbacks run, keeping the job
/// rows locked so a second worker skips them.
pub async fn run_once(pool: &PgPool, presence: &PresenceSet) -> Result<usize, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let jobs = JobRepo::claim_due(&mut tx, Utc::now(), CLAIM_BATCH).await?;
    let claimed = jobs.len();

    for job in jobs {
        match execute(pool, presence, &job).await {
            Ok(()) => JobRepo::mark_done(&mut tx, job.id).await?,
            Err(e) => {
                tracing::error!(
                    job_id = job.id,
                    job_type = %job.job_type,
                    reservation_id = job.reservation_id,
                    error = %e,
                    "Verification job failed"
                );
                JobRepo::mark_failed(&mut tx, job.id, &e.to_string()).await?;
            }
        }
    }

    tx.commit().await?;
    Ok(claimed)
}

/// Dispatch one claimed job to its callback.
async fn execute(
    pool: &PgPool,
    presence: &PresenceSet,
    job: &ScheduledJob,
) -> Result<(), VerifyError> {
    match JobType::parse(&job.job_type)? {
        JobType::CheckInVerification => verify_checked_in(pool, presence, job).await,
        JobType::CompletionVerification => verify_completed(pool, job).await,
    }
}

/// Start-time callback: cancel the reservation if the user never arrived.
///
/// A confirmed reservation means the check-in scan already happened; a
/// terminal one means there is nothing left to decide. A pending
/// reservation whose student is inside the facility is left alone; the
/// scan path owns confirmation, and the presence set is only consulted to
/// avoid cancelling someone who is demonstrably here.
async fn verify_checked_in(
    pool: &PgPool,
    presence: &PresenceSet,
    job: &ScheduledJob,
) -> Result<(), VerifyError> {
    let Some(reservation) = ReservationRepo::find_by_id(pool, job.reservation_id).await? else {
        tracing::warn!(reservation_id = job.reservation_id, "Job refers to a missing reservation");
        return Ok(());
    };

    match reservation.status()? {
        ReservationStatus::Confirmed
        | ReservationStatus::Cancelled
        | ReservationStatus::Completed => Ok(()),
        ReservationStatus::Pending => {
            if presence.is_member(&job.student_id).await? {
                tracing::debug!(
                    reservation_id = reservation.id,
                    student_id = %job.student_id,
                    "Student present but not checked in, leaving reservation pending"
                );
                return Ok(());
            }

            tracing::info!(
                reservation_id = reservation.id,
                student_id = %job.student_id,
                "No-show, cancelling reservation"
            );
            settle(ReservationRepo::cancel(pool, reservation.id, REASON_NO_SHOW).await)
        }
    }
}

/// End-time callback: complete whatever the window left open. Cancelled
/// reservations stay cancelled.
async fn verify_completed(pool: &PgPool, job: &ScheduledJob) -> Result<(), VerifyError> {
    let Some(reservation) = ReservationRepo::find_by_id(pool, job.reservation_id).await? else {
        tracing::warn!(reservation_id = job.reservation_id, "Job refers to a missing reservation");
        return Ok(());
    };

    match reservation.status()? {
        ReservationStatus::Cancelled | ReservationStatus::Completed => Ok(()),
        ReservationStatus::Pending | ReservationStatus::Confirmed => {
            settle(ReservationRepo::complete(pool, reservation.id).await)
        }
    }
}

/// Treat a lost transition race as settled: if another actor moved the
/// reservation to a terminal state between our read and our write, the
/// verification's job is done.
fn settle(result: Result<Reservation, RepoError>) -> Result<(), VerifyError> {
    match result {
        Ok(_) => Ok(()),
        Err(RepoError::Core(CoreError::Conflict(msg))) => {
            tracing::debug!(%msg, "Transition raced by another actor, treating as settled");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
