//! Route registration.

pub mod health;
pub mod reservations;
pub mod rooms;
pub mod scans;
pub mod slots;

use axum::Router;

use crate::state::AppState;

/// All routes mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/reservations", reservations::router())
        .nest("/rooms", rooms::router())
        .nest("/scans", scans::router())
        .nest("/slots", slots::router())
}
