//! Pure domain logic for the seat reservation service.
//!
//! This crate has zero internal dependencies so it can be used by the
//! repository layer, the API, and the worker alike. Anything that touches
//! the database or Redis lives in `seatwise-db` / `seatwise-cache`.

pub mod breaks;
pub mod error;
pub mod reservation;
pub mod slots;
pub mod types;
