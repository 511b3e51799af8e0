//! Route definitions for the `/scans` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::scans;
use crate::state::AppState;

/// Routes mounted at `/scans`.
///
/// ```text
/// POST   /                -> scan
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(scans::scan))
}
