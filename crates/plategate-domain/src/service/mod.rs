//! Domain services

pub mod access_decision;
pub mod normalizer;

pub use access_decision::{audit_event_for, decide};
pub use normalizer::{normalize_plate, PLATE_ALPHABET};
