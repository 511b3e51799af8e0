//! Expiring break markers.
//!
//! On check-out the monitor writes a marker whose TTL equals the
//! reservation's remaining break budget in minutes. The TTL is the
//! enforcement mechanism: no foreground timer watches the break, the key
//! simply stops existing once the budget is spent. Check-in reads and
//! deletes the marker; finding nothing means the break ran over.

use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use seatwise_core::types::{DbId, Timestamp};

use crate::error::CacheError;
use crate::CacheClient;

const KEY_PREFIX: &str = "break:";

/// Marker payload. `break_start` is the only place the break start
/// timestamp is recorded; the durable row stores remaining minutes only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakMarker {
    pub reservation_id: DbId,
    pub break_start: Timestamp,
}

/// TTL-based break marker store.
#[derive(Clone)]
pub struct BreakMarkerStore {
    client: CacheClient,
}

impl BreakMarkerStore {
    pub fn new(client: CacheClient) -> Self {
        Self { client }
    }

    fn key(reservation_id: DbId) -> String {
        format!("{KEY_PREFIX}{reservation_id}")
    }

    /// Write a marker expiring after `ttl_minutes`. A zero or negative TTL
    /// means the budget is already spent; no key is written, so the next
    /// check-in sees an expired break immediately.
    pub async fn put(&self, marker: &BreakMarker, ttl_minutes: i64) -> Result<(), CacheError> {
        if ttl_minutes <= 0 {
            return Ok(());
        }

        let payload = serde_json::to_string(marker).map_err(CacheError::Decode)?;
        let ttl_seconds = (ttl_minutes as u64) * 60;

        let mut conn = self.client.connection();
        conn.set_ex::<_, _, ()>(Self::key(marker.reservation_id), payload, ttl_seconds)
            .await
            .map_err(CacheError::Write)
    }

    /// Read the marker for a reservation, if it has not expired.
    pub async fn get(&self, reservation_id: DbId) -> Result<Option<BreakMarker>, CacheError> {
        let mut conn = self.client.connection();
        let payload: Option<String> = conn
            .get(Self::key(reservation_id))
            .await
            .map_err(CacheError::Read)?;

        payload
            .map(|p| serde_json::from_str(&p).map_err(CacheError::Decode))
            .transpose()
    }

    /// Delete the marker once the break has been settled.
    pub async fn delete(&self, reservation_id: DbId) -> Result<(), CacheError> {
        let mut conn = self.client.connection();
        conn.del::<_, ()>(Self::key(reservation_id))
            .await
            .map_err(CacheError::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn marker_serializes_round_trip() {
        let marker = BreakMarker {
            reservation_id: 42,
            break_start: Utc.with_ymd_and_hms(2026, 3, 2, 10, 15, 0).unwrap(),
        };
        let json = serde_json::to_string(&marker).unwrap();
        let back: BreakMarker = serde_json::from_str(&json).unwrap();
        assert_eq!(back, marker);
    }

    #[test]
    fn key_includes_reservation_id() {
        assert_eq!(BreakMarkerStore::key(42), "break:42");
    }
}
