pub mod reservations;
pub mod scans;
pub mod slots;
