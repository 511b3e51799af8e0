//! Handler for entry/exit scan events.
//!
//! A scan always updates the presence set, then routes to the break
//! monitor if the student has a reservation whose window contains the
//! scan time. A scan with no matching reservation is a normal outcome,
//! not an error.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use seatwise_core::types::Timestamp;
use seatwise_db::repositories::ReservationRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Direction of a scan at the facility gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Enter,
    Exit,
}

/// POST /api/v1/scans request body.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub student_id: String,
    pub scan_type: ScanType,
    /// Scan timestamp; defaults to the server clock when omitted.
    pub scanned_at: Option<Timestamp>,
}

/// POST /api/v1/scans response body.
#[derive(Debug, Serialize)]
pub struct ScanResult {
    pub remaining_break_minutes: i64,
    pub message: &'static str,
}

/// POST /api/v1/scans
///
/// Process one gate scan: update presence, then apply check-in or
/// check-out semantics to the student's active reservation, if any.
pub async fn scan(
    State(state): State<AppState>,
    Json(input): Json<ScanRequest>,
) -> AppResult<impl IntoResponse> {
    let scanned_at = input.scanned_at.unwrap_or_else(chrono::Utc::now);

    match input.scan_type {
        ScanType::Enter => state.presence.add(&input.student_id).await?,
        ScanType::Exit => state.presence.remove(&input.student_id).await?,
    }

    let reservation =
        ReservationRepo::find_active_by_student(&state.pool, &input.student_id, scanned_at)
            .await?;

    let Some(reservation) = reservation else {
        tracing::debug!(student_id = %input.student_id, "scan without an active reservation");
        return Ok(Json(DataResponse {
            data: ScanResult {
                remaining_break_minutes: 0,
                message: "No reservation",
            },
        }));
    };

    let outcome = match input.scan_type {
        ScanType::Enter => state.breaks.handle_check_in(reservation.id, scanned_at).await?,
        ScanType::Exit => state.breaks.handle_check_out(reservation.id, scanned_at).await?,
    };

    Ok(Json(DataResponse {
        data: ScanResult {
            remaining_break_minutes: outcome.remaining_break_minutes,
            message: outcome.message,
        },
    }))
}
