use sqlx::PgPool;

use seatwise_core::types::DbId;

use crate::models::user::User;

const USER_COLUMNS: &str = "id, student_id, name, email, created_at";

/// Lookups on the `users` table.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by the badge identifier the scan feed reports.
    pub async fn find_by_student_id(
        pool: &PgPool,
        student_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE student_id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(student_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a user. Used by tests and seed tooling.
    pub async fn create(
        pool: &PgPool,
        student_id: &str,
        name: &str,
        email: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (student_id, name, email) \
             VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(student_id)
            .bind(name)
            .bind(email)
            .fetch_one(pool)
            .await
    }
}
