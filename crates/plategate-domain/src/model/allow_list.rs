//! In-memory allow-list keyed by normalized plate

use std::collections::HashMap;

use plategate_types::PlateRecord;

use crate::repository::PlateRegistry;
use crate::service::normalize_plate;

/// Plates permitted to open the gate.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    records: HashMap<String, PlateRecord>,
}

impl AllowList {
    /// Build from records in source order; a later duplicate replaces an earlier one
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = PlateRecord>,
    {
        let mut list = Self::default();
        for record in records {
            list.insert(record);
        }
        list
    }

    fn insert(&mut self, mut record: PlateRecord) {
        let Some(key) = normalize_plate(&record.plate) else {
            tracing::warn!(model = %record.model, owner = %record.owner, "Skipping allow-list record with empty plate");
            return;
        };
        record.plate = key.clone();
        if let Some(previous) = self.records.insert(key, record) {
            tracing::debug!(plate = %previous.plate, "Duplicate allow-list plate, keeping the later record");
        }
    }

    /// Look up a normalized plate
    pub fn get(&self, plate: &str) -> Option<&PlateRecord> {
        self.records.get(plate)
    }

    /// Get all records sorted by plate
    pub fn all_records(&self) -> Vec<&PlateRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by(|a, b| a.plate.cmp(&b.plate));
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PlateRegistry for AllowList {
    fn lookup(&self, plate: &str) -> Option<&PlateRecord> {
        self.get(plate)
    }
}
