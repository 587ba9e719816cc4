//! Repository trait definitions for lookups and persistence

use std::path::PathBuf;

use plategate_types::{AuditEvent, CapturedFrame, PlateRecord, Result};

/// Read-only plate lookup
pub trait PlateRegistry {
    /// Find the record for a normalized plate
    fn lookup(&self, plate: &str) -> Option<&PlateRecord>;
}

/// Append-only store for audit events
pub trait AuditRepository {
    /// Append one event to its (status, date) partition
    fn append(&self, event: &AuditEvent) -> Result<()>;
}

/// Archive for captured frames
pub trait PhotoRepository {
    /// Store a frame, naming it after the plate when one was read.
    /// Returns the path written.
    fn store(&self, frame: &CapturedFrame, plate: Option<&str>) -> Result<PathBuf>;
}
