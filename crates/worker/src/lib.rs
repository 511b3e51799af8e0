//! Background worker: slot inventory maintenance and deferred
//! reservation verification.

pub mod slot_maintenance;
pub mod verifier;
