use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("No available slots for desk {desk_id} in the requested range")]
    NoAvailableSlots { desk_id: i32 },

    #[error("Reservation slots are not consecutive")]
    NonConsecutiveSlots,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Lock acquisition timed out: {0}")]
    LockTimeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
