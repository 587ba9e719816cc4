//! Infrastructure layer - file-backed repositories and hardware adapters

pub mod allow_list_csv;
pub mod audit_log;
pub mod gpio;
pub mod photo_archive;
pub mod retention;

pub use allow_list_csv::{load_allow_list, parse_allow_list};
pub use audit_log::FileAuditLog;
pub use photo_archive::PhotoArchive;
pub use retention::{sweep_photo_dirs, SweepReport};
