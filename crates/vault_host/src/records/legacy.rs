//! Reader for record lists written by earlier front-ends.
//!
//! Those builds persisted a bare JSON array of camelCase items, either directly
//! (`[{ "id", "name", "size", "grNo", "uploadDate", ... }]`) or wrapped together with the base64
//! payload (`[{ "fileData": {...}, "base64": "data:..." }]`).

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::types::{reserve_serial_ordinals, FileKind, FileRecord, SerialNumber, SerialPolicy};
use crate::preview::MediaKind;

/// Timestamps above this are milliseconds, below are seconds.
const SECONDS_CUTOFF: f64 = 9_999_999_999.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyFileItem {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    size: f64,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    data_url: Option<String>,
    #[serde(default)]
    gr_no: Option<String>,
    #[serde(default)]
    upload_date: Option<f64>,
    #[serde(default)]
    modification_time: Option<f64>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    is_directory: bool,
    #[serde(default, rename = "type")]
    item_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyEntry {
    #[serde(rename_all = "camelCase")]
    Wrapped {
        file_data: LegacyFileItem,
        #[serde(default)]
        base64: Option<String>,
    },
    Plain(LegacyFileItem),
}

fn timestamp_ms(item: &LegacyFileItem) -> u64 {
    if let Some(ms) = item.upload_date.filter(|value| *value > 0.0) {
        return ms as u64;
    }
    if let Some(raw) = item.modification_time.filter(|value| *value > 0.0) {
        let ms = if raw > SECONDS_CUTOFF { raw } else { raw * 1000.0 };
        return ms as u64;
    }
    item.date
        .as_deref()
        .and_then(|date| NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis().max(0) as u64)
        .unwrap_or(0)
}

/// Id for an item saved without one. Derived from its position and contents so that every read
/// of the same unmigrated list yields the same id.
fn derived_record_id(index: usize, item: &LegacyFileItem, created_at_unix_ms: u64) -> String {
    let key = format!(
        "grvault-legacy:{index}:{}:{}:{created_at_unix_ms}",
        item.name, item.size
    );
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}

fn into_record(
    index: usize,
    item: LegacyFileItem,
    inline_payload: Option<String>,
) -> (FileRecord, bool) {
    let created_at_unix_ms = timestamp_ms(&item);
    let id = item
        .id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| derived_record_id(index, &item, created_at_unix_ms));
    let is_folder = item.is_directory || item.item_type.as_deref() == Some("folder");
    let location_ref = item
        .uri
        .or(item.data_url)
        .or(inline_payload)
        .filter(|value| !value.trim().is_empty());
    let has_serial = item.gr_no.as_deref().is_some_and(|gr| !gr.trim().is_empty());
    let record = FileRecord {
        id,
        media: MediaKind::from_name(&item.name),
        display_name: item.name,
        size_bytes: item.size.max(0.0) as u64,
        created_at_unix_ms,
        serial_number: SerialNumber::from_raw(item.gr_no.unwrap_or_default()),
        location_ref,
        kind: if is_folder {
            FileKind::Folder
        } else {
            FileKind::File
        },
    };
    (record, has_serial)
}

/// Converts a legacy JSON array into records, allocating serials for items that had none.
///
/// # Errors
///
/// Returns an error when `raw` is not an array of recognizable items, or when the items lacking a
/// serial cannot be numbered without passing `u32::MAX`.
pub(crate) fn migrate_legacy_items(
    raw: Value,
    policy: &SerialPolicy,
) -> Result<Vec<FileRecord>, String> {
    let entries: Vec<LegacyEntry> = serde_json::from_value(raw)
        .map_err(|err| format!("unrecognized legacy record list: {err}"))?;

    let mut records = Vec::with_capacity(entries.len());
    let mut missing_serial = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let (record, has_serial) = match entry {
            LegacyEntry::Wrapped { file_data, base64 } => into_record(index, file_data, base64),
            LegacyEntry::Plain(item) => into_record(index, item, None),
        };
        if !has_serial {
            missing_serial.push(records.len());
        }
        records.push(record);
    }

    let ordinals = reserve_serial_ordinals(&records, missing_serial.len())
        .ok_or_else(|| "serial numbers are exhausted; cannot number legacy items".to_string())?;
    for (idx, ordinal) in missing_serial.into_iter().zip(ordinals) {
        let record = &mut records[idx];
        record.serial_number = policy.format(ordinal, record.created_at_unix_ms);
    }
    Ok(records)
}
