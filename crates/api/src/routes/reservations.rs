//! Route definitions for the `/reservations` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::reservations;
use crate::state::AppState;

/// Routes mounted at `/reservations`.
///
/// ```text
/// GET    /                -> list (by ?user_id=)
/// POST   /                -> book
/// GET    /{id}            -> get
/// POST   /{id}/cancel     -> cancel
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(reservations::list).post(reservations::book))
        .route("/{id}", get(reservations::get))
        .route("/{id}/cancel", post(reservations::cancel))
}
