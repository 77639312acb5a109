//! File record model and GR serial numbers.

use std::{fmt, ops::RangeInclusive};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::preview::MediaKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
/// Record kind.
pub enum FileKind {
    /// Regular uploaded file.
    #[default]
    File,
    /// Folder placeholder.
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
/// Human-readable serial label such as `GR-0007-431920`.
///
/// The label is kept verbatim so serials written by older builds (for example `GR-001`) survive
/// untouched; only the ordinal is interpreted.
pub struct SerialNumber(String);

impl SerialNumber {
    /// Wraps an existing label without validation.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the label.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the counter out of `<prefix>-<digits>[-<suffix>]`.
    ///
    /// The prefix is not checked against any policy, so labels produced under a different prefix
    /// still participate in ordinal allocation.
    pub fn ordinal(&self) -> Option<u32> {
        let (prefix, rest) = self.0.trim().split_once('-')?;
        if prefix.is_empty() || !prefix.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return None;
        }
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return None;
        }
        digits.parse().ok()
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// How new serial numbers are rendered.
pub struct SerialPolicy {
    /// Alphabetic label before the first dash.
    pub prefix: String,
    /// Minimum zero-padded width of the ordinal.
    pub width: usize,
    /// Appends the last six digits of the upload timestamp.
    pub timestamp_suffix: bool,
}

impl Default for SerialPolicy {
    fn default() -> Self {
        Self {
            prefix: "GR".to_string(),
            width: 4,
            timestamp_suffix: true,
        }
    }
}

impl SerialPolicy {
    /// Renders a serial number for `ordinal` uploaded at `uploaded_at_unix_ms`.
    pub fn format(&self, ordinal: u32, uploaded_at_unix_ms: u64) -> SerialNumber {
        let width = self.width;
        let mut label = format!("{}-{:0width$}", self.prefix, ordinal);
        if self.timestamp_suffix {
            label.push_str(&format!("-{:06}", uploaded_at_unix_ms % 1_000_000));
        }
        SerialNumber(label)
    }
}

/// Returns `max(ordinal) + 1` over `records`; unparseable serials count as zero.
///
/// `None` once an existing serial already holds `u32::MAX`.
pub fn next_serial_ordinal<'a>(
    records: impl IntoIterator<Item = &'a FileRecord>,
) -> Option<u32> {
    records
        .into_iter()
        .filter_map(|record| record.serial_number.ordinal())
        .max()
        .unwrap_or(0)
        .checked_add(1)
}

/// Reserves `count` consecutive ordinals after the highest one in `records`.
///
/// `None` when the run would pass `u32::MAX`; ordinals are never reused.
pub fn reserve_serial_ordinals<'a>(
    records: impl IntoIterator<Item = &'a FileRecord>,
    count: usize,
) -> Option<RangeInclusive<u32>> {
    if count == 0 {
        return Some(1..=0);
    }
    let first = next_serial_ordinal(records)?;
    let last = first.checked_add(u32::try_from(count - 1).ok()?)?;
    Some(first..=last)
}

/// Allocates a fresh record id.
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Metadata describing one uploaded file, distinct from its bytes.
pub struct FileRecord {
    /// Unique, immutable id.
    pub id: String,
    /// Name shown in listings.
    pub display_name: String,
    /// Size of the stored bytes.
    pub size_bytes: u64,
    /// Upload time in unix milliseconds.
    pub created_at_unix_ms: u64,
    /// GR serial label.
    pub serial_number: SerialNumber,
    /// Blob-store reference, absent for records without bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_ref: Option<String>,
    /// File or folder.
    #[serde(default)]
    pub kind: FileKind,
    /// Media family derived from the name.
    #[serde(default)]
    pub media: MediaKind,
}

impl FileRecord {
    /// Builds a file record with a fresh id.
    pub fn new_file(
        display_name: impl Into<String>,
        size_bytes: u64,
        serial_number: SerialNumber,
        created_at_unix_ms: u64,
        location_ref: Option<String>,
    ) -> Self {
        let display_name = display_name.into();
        let media = MediaKind::from_name(&display_name);
        Self {
            id: new_record_id(),
            display_name,
            size_bytes,
            created_at_unix_ms,
            serial_number,
            location_ref,
            kind: FileKind::File,
            media,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where the bytes of a new upload come from.
pub enum UploadSource {
    /// Raw bytes to be written through the blob store.
    Bytes(Vec<u8>),
    /// Bytes already stored elsewhere, referenced verbatim.
    Existing {
        /// Blob reference to record.
        location_ref: String,
        /// Known size of the referenced bytes.
        size_bytes: u64,
    },
    /// Metadata only.
    Empty {
        /// Declared size.
        size_bytes: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Input to [`crate::FileCatalog::add_record`].
pub struct NewRecord {
    /// Display name of the upload.
    pub display_name: String,
    /// Byte source.
    pub source: UploadSource,
}

impl NewRecord {
    /// Upload carrying its bytes.
    pub fn from_bytes(display_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            display_name: display_name.into(),
            source: UploadSource::Bytes(bytes),
        }
    }

    /// Upload referencing bytes that are already stored.
    pub fn from_location(
        display_name: impl Into<String>,
        size_bytes: u64,
        location_ref: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            source: UploadSource::Existing {
                location_ref: location_ref.into(),
                size_bytes,
            },
        }
    }

    /// Metadata-only record.
    pub fn metadata_only(display_name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            display_name: display_name.into(),
            source: UploadSource::Empty { size_bytes },
        }
    }

    /// Size the record will report.
    pub fn size_bytes(&self) -> u64 {
        match &self.source {
            UploadSource::Bytes(bytes) => bytes.len() as u64,
            UploadSource::Existing { size_bytes, .. } | UploadSource::Empty { size_bytes } => {
                *size_bytes
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record_with_serial(serial: &str) -> FileRecord {
        FileRecord::new_file("a.txt", 1, SerialNumber::from_raw(serial), 1, None)
    }

    #[test]
    fn parses_ordinals_from_current_and_legacy_labels() {
        let cases = [
            ("GR-0003-123456", Some(3)),
            ("GR-001", Some(1)),
            ("gr-12", Some(12)),
            ("INV-0042", Some(42)),
            ("GR-", None),
            ("GR-abc", None),
            ("0003", None),
            ("", None),
        ];
        for (raw, expected) in cases {
            assert_eq!(
                SerialNumber::from_raw(raw).ordinal(),
                expected,
                "raw={raw:?}"
            );
        }
    }

    #[test]
    fn policy_formats_padding_and_timestamp_suffix() {
        let policy = SerialPolicy::default();
        assert_eq!(
            policy.format(7, 1_700_000_431_920).as_str(),
            "GR-0007-431920"
        );
        assert_eq!(policy.format(12345, 1_000_000_000_042).as_str(), "GR-12345-000042");

        let bare = SerialPolicy {
            prefix: "GR".to_string(),
            width: 3,
            timestamp_suffix: false,
        };
        assert_eq!(bare.format(5, 0).as_str(), "GR-005");
    }

    #[test]
    fn next_ordinal_is_max_plus_one_not_count_plus_one() {
        let records = vec![
            record_with_serial("GR-0001-000001"),
            record_with_serial("GR-0009-000002"),
            record_with_serial("not-a-serial"),
        ];
        assert_eq!(next_serial_ordinal(&records), Some(10));
        assert_eq!(next_serial_ordinal(&Vec::<FileRecord>::new()), Some(1));
    }

    #[test]
    fn ordinals_stop_at_the_u32_limit_instead_of_repeating() {
        let full = vec![record_with_serial("GR-4294967295")];
        assert_eq!(next_serial_ordinal(&full), None);
        assert_eq!(reserve_serial_ordinals(&full, 1), None);
        assert_eq!(reserve_serial_ordinals(&full, 0), Some(1..=0));

        let one_left = vec![record_with_serial("GR-4294967294")];
        assert_eq!(
            reserve_serial_ordinals(&one_left, 1),
            Some(u32::MAX..=u32::MAX)
        );
        assert_eq!(reserve_serial_ordinals(&one_left, 2), None);
        assert_eq!(reserve_serial_ordinals(&Vec::<FileRecord>::new(), 3), Some(1..=3));
    }

    #[test]
    fn new_file_records_get_unique_ids_and_media_kind() {
        let a = FileRecord::new_file("scan.PNG", 10, SerialNumber::from_raw("GR-1"), 5, None);
        let b = FileRecord::new_file("scan.PNG", 10, SerialNumber::from_raw("GR-1"), 5, None);
        assert_ne!(a.id, b.id);
        assert_eq!(a.media, MediaKind::Image);
        assert_eq!(a.kind, FileKind::File);
    }

    #[test]
    fn record_wire_shape_keeps_serial_as_plain_string() {
        let mut record = record_with_serial("GR-0001-000001");
        record.id = "fixed".to_string();
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["serial_number"], json!("GR-0001-000001"));
        assert_eq!(value["kind"], json!("file"));
        assert!(value.get("location_ref").is_none());

        let back: FileRecord = serde_json::from_value(json!({
            "id": "x",
            "display_name": "a.txt",
            "size_bytes": 3,
            "created_at_unix_ms": 9,
            "serial_number": "GR-2"
        }))
        .expect("deserialize with defaults");
        assert_eq!(back.kind, FileKind::File);
        assert_eq!(back.media, MediaKind::Unknown);
    }

    #[test]
    fn new_record_reports_size_per_source() {
        assert_eq!(NewRecord::from_bytes("a", vec![0; 4]).size_bytes(), 4);
        assert_eq!(NewRecord::from_location("a", 9, "blob.x").size_bytes(), 9);
        assert_eq!(NewRecord::metadata_only("a", 512).size_bytes(), 512);
    }
}
