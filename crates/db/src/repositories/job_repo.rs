use sqlx::{PgPool, Postgres, Transaction};

use seatwise_core::types::{DbId, Timestamp};

use crate::models::scheduled_job::ScheduledJob;

const JOB_COLUMNS: &str = "\
    id, job_type, reservation_id, student_id, run_at, status, last_error, \
    created_at, completed_at";

/// Dispatcher-side operations on the `scheduled_jobs` table.
///
/// Jobs are inserted by the booking transaction (see
/// `ReservationRepo::book`) and consumed here. Claiming uses
/// `FOR UPDATE SKIP LOCKED` so multiple worker processes can poll the same
/// table: a job stays locked while its callback runs and returns to
/// `pending` if the worker dies before committing: at-least-once delivery
/// backed by idempotent callbacks.
pub struct JobRepo;

impl JobRepo {
    /// Claim up to `limit` due jobs inside `tx`. The rows stay locked until
    /// the transaction ends.
    pub async fn claim_due(
        tx: &mut Transaction<'_, Postgres>,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<ScheduledJob>, sqlx::Error> {
        let query = format!(
            "SELECT {JOB_COLUMNS} FROM scheduled_jobs \
             WHERE status = 'pending' AND run_at <= $1 \
             ORDER BY run_at \
             LIMIT $2 \
             FOR UPDATE SKIP LOCKED"
        );
        sqlx::query_as::<_, ScheduledJob>(&query)
            .bind(now)
            .bind(limit)
            .fetch_all(&mut **tx)
            .await
    }

    /// Mark a claimed job as executed.
    pub async fn mark_done(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE scheduled_jobs SET status = 'done', completed_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Mark a claimed job as failed, recording the error for operators.
    /// Failed jobs are not retried automatically; the verifier callbacks
    /// are no-ops on terminal reservations, so manual replays are safe.
    pub async fn mark_failed(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE scheduled_jobs \
             SET status = 'failed', last_error = $2, completed_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Jobs scheduled for a reservation. Test/diagnostic helper.
    pub async fn list_by_reservation(
        pool: &PgPool,
        reservation_id: DbId,
    ) -> Result<Vec<ScheduledJob>, sqlx::Error> {
        let query = format!(
            "SELECT {JOB_COLUMNS} FROM scheduled_jobs \
             WHERE reservation_id = $1 \
             ORDER BY run_at"
        );
        sqlx::query_as::<_, ScheduledJob>(&query)
            .bind(reservation_id)
            .fetch_all(pool)
            .await
    }
}
