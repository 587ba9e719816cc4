//! Retention sweep for the photo archive

use std::fs;
use std::io;
use std::path::Path;

use chrono::{Days, NaiveDate};
use walkdir::WalkDir;

use crate::photo_archive::DAY_DIR_FORMAT;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Day directories deleted
    pub removed: usize,
    /// Day directories inside the retention window
    pub kept: usize,
    /// Entries left alone because they are not day directories
    pub skipped: usize,
}

/// Delete day directories under `root` dated on or before `today - retention_days`.
///
/// A directory's age is measured from its midnight, so the day exactly
/// `retention_days` back is already expired once the day has started.
/// Only immediate children named `YYYY-MM-DD` are considered. A missing root
/// is not an error.
pub fn sweep_photo_dirs(root: &Path, retention_days: u32, today: NaiveDate) -> io::Result<SweepReport> {
    let mut report = SweepReport::default();
    if !root.is_dir() {
        tracing::debug!(root = %root.display(), "Photo root missing, nothing to sweep");
        return Ok(report);
    }

    let cutoff = today
        .checked_sub_days(Days::new(u64::from(retention_days)))
        .unwrap_or(NaiveDate::MIN);

    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        let name = entry.file_name().to_string_lossy();

        let date = match NaiveDate::parse_from_str(&name, DAY_DIR_FORMAT) {
            Ok(date) if entry.file_type().is_dir() => date,
            _ => {
                report.skipped += 1;
                continue;
            }
        };

        if date <= cutoff {
            match fs::remove_dir_all(entry.path()) {
                Ok(()) => {
                    tracing::info!(dir = %entry.path().display(), "Removed expired photo directory");
                    report.removed += 1;
                }
                Err(e) => {
                    tracing::warn!(dir = %entry.path().display(), error = %e, "Failed to remove photo directory");
                    report.kept += 1;
                }
            }
        } else {
            report.kept += 1;
        }
    }

    Ok(report)
}
