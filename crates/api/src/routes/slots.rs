//! Route definitions for the `/slots` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::slots;
use crate::state::AppState;

/// Routes mounted at `/slots`.
///
/// ```text
/// GET    /desks/{desk_id} -> free_by_desk
/// GET    /rooms/{room_id} -> free_by_room
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/desks/{desk_id}", get(slots::free_by_desk))
        .route("/rooms/{room_id}", get(slots::free_by_room))
}
