//! Route definitions for the `/rooms` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::reservations;
use crate::state::AppState;

/// Routes mounted at `/rooms`.
///
/// ```text
/// GET    /{room_id}/reservations -> active_by_room
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{room_id}/reservations", get(reservations::active_by_room))
}
