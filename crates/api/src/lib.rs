//! HTTP service: booking, scan processing, and inventory queries.

pub mod breaks;
pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
