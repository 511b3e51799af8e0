use seatwise_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table. Account management is out of scope; this
/// is the minimum booking and scan processing need.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    /// Badge/card identifier reported by the scan feed.
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub created_at: Timestamp,
}
