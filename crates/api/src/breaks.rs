//! Break monitoring across the durable and ephemeral stores.
//!
//! The reservation row carries the budget that must survive restarts
//! (`remaining_break_minutes`, `on_break`); the expiring marker carries the
//! break start timestamp and enforces the deadline through its TTL. Both
//! check-in and check-out serialize on the reservation row lock, so two
//! scans for the same reservation can never interleave.
//!
//! The scan outcome itself is decided by the pure functions in
//! [`seatwise_core::breaks`]; this module only fetches their inputs and
//! applies the resulting writes.

use seatwise_cache::break_marker::{BreakMarker, BreakMarkerStore};
use seatwise_core::breaks::{self, CheckInAction, CheckOutAction};
use seatwise_core::error::CoreError;
use seatwise_core::reservation::REASON_BREAK_EXCEEDED;
use seatwise_core::types::{DbId, Timestamp};
use seatwise_db::repositories::ReservationRepo;
use seatwise_db::DbPool;

use crate::error::AppError;

/// Outcome of a scan handled by the monitor, echoed back to the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakOutcome {
    /// Break budget after this scan, in whole minutes.
    pub remaining_break_minutes: i64,
    /// Human-readable result for the scanner display.
    pub message: &'static str,
}

/// Coordinates the durable reservation row and the expiring break marker.
#[derive(Clone)]
pub struct BreakMonitor {
    pool: DbPool,
    markers: BreakMarkerStore,
    max_break_minutes: i64,
}

impl BreakMonitor {
    pub fn new(pool: DbPool, markers: BreakMarkerStore, max_break_minutes: i64) -> Self {
        Self {
            pool,
            markers,
            max_break_minutes,
        }
    }

    /// Handle an ENTER scan for an active reservation.
    ///
    /// Not on a break: confirm the reservation. The full budget is granted
    /// only on the first check-in ever; afterwards the recorded budget
    /// stands, so repeat scans can never refill it.
    ///
    /// On a break: consult the marker. A live marker means the user is
    /// back in time; charge the elapsed minutes against the budget. A
    /// missing marker means the TTL fired while they were away; the break
    /// ran over and the reservation is cancelled.
    pub async fn handle_check_in(
        &self,
        reservation_id: DbId,
        scanned_at: Timestamp,
    ) -> Result<BreakOutcome, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let reservation = ReservationRepo::lock_for_update(&mut tx, reservation_id)
            .await
            .map_err(AppError::Database)?
            .ok_or(CoreError::NotFound {
                entity: "Reservation",
                id: reservation_id,
            })?;

        let break_start = if reservation.on_break {
            self.markers
                .get(reservation_id)
                .await?
                .map(|marker| marker.break_start)
        } else {
            None
        };

        let action = breaks::check_in_action(
            reservation.on_break,
            reservation.remaining_break_minutes,
            break_start,
            scanned_at,
            self.max_break_minutes,
        );

        match action {
            CheckInAction::Arrival { budget_minutes }
            | CheckInAction::Reconfirm {
                remaining_minutes: budget_minutes,
            } => {
                ReservationRepo::record_arrival(&mut tx, reservation_id, budget_minutes)
                    .await
                    .map_err(AppError::Database)?;
                tx.commit().await.map_err(AppError::Database)?;

                Ok(BreakOutcome {
                    remaining_break_minutes: budget_minutes,
                    message: "Checked in",
                })
            }
            CheckInAction::EndBreak { remaining_minutes } => {
                ReservationRepo::record_break_end(&mut tx, reservation_id, remaining_minutes)
                    .await
                    .map_err(AppError::Database)?;
                tx.commit().await.map_err(AppError::Database)?;

                // The row is already settled; a leftover marker simply expires.
                if let Err(err) = self.markers.delete(reservation_id).await {
                    tracing::warn!(reservation_id, error = %err, "failed to delete break marker");
                }

                Ok(BreakOutcome {
                    remaining_break_minutes: remaining_minutes,
                    message: "Checked in",
                })
            }
            CheckInAction::BreakExpired => {
                ReservationRepo::record_cancellation(
                    &mut tx,
                    reservation_id,
                    REASON_BREAK_EXCEEDED,
                )
                .await
                .map_err(AppError::Database)?;
                tx.commit().await.map_err(AppError::Database)?;

                tracing::info!(reservation_id, "break budget exhausted, reservation cancelled");
                Ok(BreakOutcome {
                    remaining_break_minutes: 0,
                    message: "Break time exceeded, reservation cancelled",
                })
            }
        }
    }

    /// Handle an EXIT scan for an active reservation: start a break.
    ///
    /// The marker write happens before the durable commit. If the marker
    /// cannot be written the scan fails and nothing is persisted; a marker
    /// orphaned by a failed commit expires on its own and the row still
    /// says the user is present.
    ///
    /// A repeat EXIT while already on a break reports the budget and
    /// leaves the marker alone; rewriting it would restart the TTL.
    pub async fn handle_check_out(
        &self,
        reservation_id: DbId,
        scanned_at: Timestamp,
    ) -> Result<BreakOutcome, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let reservation = ReservationRepo::lock_for_update(&mut tx, reservation_id)
            .await
            .map_err(AppError::Database)?
            .ok_or(CoreError::NotFound {
                entity: "Reservation",
                id: reservation_id,
            })?;

        let action = breaks::check_out_action(
            reservation.on_break,
            reservation.remaining_break_minutes,
            self.max_break_minutes,
        );

        match action {
            CheckOutAction::AlreadyOnBreak { remaining_minutes } => Ok(BreakOutcome {
                remaining_break_minutes: remaining_minutes,
                message: "Checked out",
            }),
            CheckOutAction::StartBreak { budget_minutes } => {
                let marker = BreakMarker {
                    reservation_id,
                    break_start: scanned_at,
                };
                self.markers.put(&marker, budget_minutes).await?;

                ReservationRepo::record_break_start(&mut tx, reservation_id, budget_minutes)
                    .await
                    .map_err(AppError::Database)?;
                tx.commit().await.map_err(AppError::Database)?;

                Ok(BreakOutcome {
                    remaining_break_minutes: budget_minutes,
                    message: "Checked out",
                })
            }
        }
    }
}
