//! Handlers for the `/reservations` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use seatwise_core::error::CoreError;
use seatwise_core::types::DbId;
use seatwise_db::models::reservation::{BookReservation, CancelReservation, Reservation};
use seatwise_db::models::slot::Slot;
use seatwise_db::repositories::{ReservationRepo, SlotRepo};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /api/v1/reservations`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: DbId,
}

/// Reservation together with the slots it owns.
#[derive(Debug, Serialize)]
pub struct ReservationDetail {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub slots: Vec<Slot>,
}

/// POST /api/v1/reservations
///
/// Book a contiguous run of free slots on one desk. Returns 201 with the
/// created reservation (status `pending` until the first check-in scan).
pub async fn book(
    State(state): State<AppState>,
    Json(input): Json<BookReservation>,
) -> AppResult<impl IntoResponse> {
    let reservation = ReservationRepo::book(&state.pool, &input).await?;

    tracing::info!(
        reservation_id = reservation.id,
        user_id = input.user_id,
        desk_id = input.desk_id,
        "Reservation booked",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: reservation })))
}

/// GET /api/v1/reservations?user_id={id}
///
/// List a user's reservations, most recent first.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let reservations = ReservationRepo::list_by_user(&state.pool, params.user_id).await?;
    Ok(Json(DataResponse { data: reservations }))
}

/// GET /api/v1/reservations/{id}
///
/// Get a reservation with the slots it owns.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let reservation = ReservationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Reservation",
            id,
        })?;
    let slots = SlotRepo::list_by_reservation(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: ReservationDetail { reservation, slots },
    }))
}

/// POST /api/v1/reservations/{id}/cancel
///
/// Cancel a reservation with a caller-supplied reason. Cancelling a
/// terminal reservation returns 409.
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CancelReservation>,
) -> AppResult<impl IntoResponse> {
    let reservation = ReservationRepo::cancel(&state.pool, id, &input.reason).await?;

    tracing::info!(reservation_id = id, reason = %input.reason, "Reservation cancelled");

    Ok(Json(DataResponse { data: reservation }))
}

/// GET /api/v1/rooms/{room_id}/reservations
///
/// Reservations currently in progress in a room.
pub async fn active_by_room(
    State(state): State<AppState>,
    Path(room_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let now = chrono::Utc::now();
    let reservations = ReservationRepo::list_active_by_room(&state.pool, room_id, now).await?;
    Ok(Json(DataResponse { data: reservations }))
}
