//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the operations that create or mutate it

pub mod reservation;
pub mod scheduled_job;
pub mod slot;
pub mod user;
