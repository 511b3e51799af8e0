use seatwise_core::error::CoreError;

/// Error type for repository operations that mix domain validation with
/// database access (the booking transaction, break updates).
///
/// Plain CRUD methods return `sqlx::Error` directly; this wrapper exists so
/// a single transaction can surface either kind without losing the sqlx
/// classification the API layer relies on.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// PostgreSQL `lock_not_available` (raised when `lock_timeout` fires).
pub const PG_LOCK_NOT_AVAILABLE: &str = "55P03";

/// Translate a lock-timeout database error into the domain's retryable
/// [`CoreError::LockTimeout`]; leave everything else as a database error.
pub fn map_lock_timeout(err: sqlx::Error, context: &str) -> RepoError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some(PG_LOCK_NOT_AVAILABLE) {
            return RepoError::Core(CoreError::LockTimeout(context.to_string()));
        }
    }
    RepoError::Database(err)
}
