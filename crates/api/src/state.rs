use std::sync::Arc;

use seatwise_cache::presence::PresenceSet;

use crate::breaks::BreakMonitor;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: seatwise_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Break monitor (durable rows plus expiring markers).
    pub breaks: BreakMonitor,
    /// Presence set updated by entry/exit scans.
    pub presence: PresenceSet,
}
