//! CSV loader for the allow-list
//!
//! Expected header (any order, case-insensitive): `plate,model,owner`, or the
//! Russian column names `Номер,Модель,Владелец`. Files exported from Excel on
//! Russian Windows are often CP1251; those are decoded transparently.

use std::path::Path;

use encoding_rs::WINDOWS_1251;
use plategate_domain::model::AllowList;
use plategate_types::{PlateRecord, RegistryError};

const PLATE_COLUMNS: &[&str] = &["plate", "номер"];
const MODEL_COLUMNS: &[&str] = &["model", "модель"];
const OWNER_COLUMNS: &[&str] = &["owner", "владелец"];

/// Load the allow-list from a CSV file
pub fn load_allow_list<P: AsRef<Path>>(path: P) -> Result<AllowList, RegistryError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RegistryError::SourceMissing(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)?;
    let list = parse_allow_list(&bytes)?;
    tracing::info!(path = %path.display(), plates = list.len(), "Allow-list loaded");
    Ok(list)
}

/// Parse allow-list CSV bytes (UTF-8 with optional BOM, or CP1251)
pub fn parse_allow_list(bytes: &[u8]) -> Result<AllowList, RegistryError> {
    let text = decode(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let plate_idx = column_index(&headers, PLATE_COLUMNS)?;
    let model_idx = column_index(&headers, MODEL_COLUMNS)?;
    let owner_idx = column_index(&headers, OWNER_COLUMNS)?;

    let mut records = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let row = result?;
        let row_num = row_idx + 2; // header is row 1

        let field = |idx: usize| row.get(idx).unwrap_or("").trim().to_string();
        let plate = field(plate_idx);
        if plate.is_empty() {
            tracing::warn!(row = row_num, "Allow-list row has no plate, skipped");
            continue;
        }
        records.push(PlateRecord::new(plate, field(model_idx), field(owner_idx)));
    }

    Ok(AllowList::from_records(records))
}

fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (decoded, _, had_errors) = WINDOWS_1251.decode(bytes);
            if had_errors {
                tracing::warn!("Some allow-list characters could not be decoded from CP1251");
            } else {
                tracing::warn!("Allow-list is not UTF-8, decoded as CP1251");
            }
            decoded.into_owned()
        }
    }
}

fn column_index(headers: &csv::StringRecord, names: &[&str]) -> Result<usize, RegistryError> {
    headers
        .iter()
        .position(|h| {
            let h = h.trim().to_lowercase();
            names.iter().any(|name| h == *name)
        })
        .ok_or_else(|| RegistryError::MalformedSource(format!("missing required column: {}", names[0])))
}
