//! Append-only audit log, one file per (status, date)
//!
//! Layout: `<logs_dir>/<status_slug>_<YYYY-MM-DD>.log`, one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use chrono::NaiveDate;
use plategate_domain::repository::AuditRepository;
use plategate_types::{AuditEvent, AuditStatus, Result};

pub struct FileAuditLog {
    logs_dir: PathBuf,
}

impl FileAuditLog {
    /// Open (and create if needed) the log directory
    pub fn open(logs_dir: impl Into<PathBuf>) -> Result<Self> {
        let logs_dir = logs_dir.into();
        fs::create_dir_all(&logs_dir)?;
        Ok(Self { logs_dir })
    }

    /// Partition file for a status on a given day
    pub fn partition_path(&self, status: AuditStatus, date: NaiveDate) -> PathBuf {
        self.logs_dir
            .join(format!("{}_{}.log", status.slug(), date.format("%Y-%m-%d")))
    }

    /// Read back one partition; a missing file is an empty day
    pub fn read_day(&self, status: AuditStatus, date: NaiveDate) -> Result<Vec<AuditEvent>> {
        let path = self.partition_path(status, date);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(fs::File::open(&path)?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEvent>(&line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable audit line");
                }
            }
        }
        Ok(events)
    }

    /// All events of a day across every status, oldest first
    pub fn read_all_for_day(&self, date: NaiveDate) -> Result<Vec<AuditEvent>> {
        let mut events = Vec::new();
        for status in AuditStatus::ALL {
            events.extend(self.read_day(status, date)?);
        }
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(events)
    }
}

impl AuditRepository for FileAuditLog {
    fn append(&self, event: &AuditEvent) -> Result<()> {
        let path = self.partition_path(event.status, event.timestamp.date_naive());
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}
