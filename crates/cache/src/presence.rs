//! The "inside" presence set.
//!
//! ENTER scans add the student id, EXIT scans remove it. The set is a
//! corroborating signal for the no-show verifier only; reservation status
//! in the database remains the source of truth for every decision.

use redis::AsyncCommands;

use crate::error::CacheError;
use crate::CacheClient;

const INSIDE_SET_KEY: &str = "seatwise:inside";

/// Membership set of students currently inside the facility.
#[derive(Clone)]
pub struct PresenceSet {
    client: CacheClient,
}

impl PresenceSet {
    pub fn new(client: CacheClient) -> Self {
        Self { client }
    }

    /// Record that a student entered.
    pub async fn add(&self, student_id: &str) -> Result<(), CacheError> {
        let mut conn = self.client.connection();
        conn.sadd::<_, _, ()>(INSIDE_SET_KEY, student_id)
            .await
            .map_err(CacheError::Write)
    }

    /// Record that a student left.
    pub async fn remove(&self, student_id: &str) -> Result<(), CacheError> {
        let mut conn = self.client.connection();
        conn.srem::<_, _, ()>(INSIDE_SET_KEY, student_id)
            .await
            .map_err(CacheError::Write)
    }

    /// Is the student currently inside?
    pub async fn is_member(&self, student_id: &str) -> Result<bool, CacheError> {
        let mut conn = self.client.connection();
        conn.sismember(INSIDE_SET_KEY, student_id)
            .await
            .map_err(CacheError::Read)
    }
}
