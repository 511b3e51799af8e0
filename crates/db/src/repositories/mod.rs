//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or a transaction) as the first argument. Plain CRUD
//! returns `sqlx::Error`; operations that enforce domain rules inside a
//! transaction return [`crate::error::RepoError`].

pub mod job_repo;
pub mod reservation_repo;
pub mod slot_repo;
pub mod user_repo;

pub use job_repo::JobRepo;
pub use reservation_repo::ReservationRepo;
pub use slot_repo::SlotRepo;
pub use user_repo::UserRepo;
