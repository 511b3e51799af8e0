//! Ephemeral store: Redis-backed break markers and the presence set.
//!
//! The durable database is the source of truth for reservation state; this
//! crate holds only the two expiring signals the break monitor and the
//! no-show verifier consult:
//!
//! - a **break marker** per reservation, whose TTL equals the remaining
//!   break budget; its absence on check-in means the budget ran out while
//!   the user was away;
//! - the **presence set** of student ids currently inside the facility,
//!   used as a corroborating signal only.

pub mod break_marker;
pub mod error;
pub mod presence;

use redis::aio::ConnectionManager;
use redis::Client;

use crate::error::CacheError;

/// Shared Redis handle. Cheap to clone; `ConnectionManager` multiplexes and
/// reconnects internally.
#[derive(Clone)]
pub struct CacheClient {
    conn: ConnectionManager,
}

impl CacheClient {
    /// Connect to Redis at `redis_url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url).map_err(CacheError::Connection)?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(CacheError::Connection)?;
        Ok(Self { conn })
    }

    pub(crate) fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}
