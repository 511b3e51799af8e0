//! Handlers for slot availability queries.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use seatwise_db::repositories::SlotRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/slots/desks/{desk_id}
///
/// Free slots for one desk, ordered by start time.
pub async fn free_by_desk(
    State(state): State<AppState>,
    Path(desk_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let slots = SlotRepo::list_free_by_desk(&state.pool, desk_id).await?;
    Ok(Json(DataResponse { data: slots }))
}

/// GET /api/v1/slots/rooms/{room_id}
///
/// Free slots across every desk in a room.
pub async fn free_by_room(
    State(state): State<AppState>,
    Path(room_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let slots = SlotRepo::list_free_by_room(&state.pool, room_id).await?;
    Ok(Json(DataResponse { data: slots }))
}
