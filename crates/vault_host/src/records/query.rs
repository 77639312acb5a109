//! Pure list transformation behind every listing: search, field filter, then sort.

use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::types::FileRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
/// Listing order.
pub enum SortOrder {
    /// Most recent upload first.
    #[default]
    Newest,
    /// Oldest upload first.
    Oldest,
    /// Display name, case-insensitive.
    Name,
    /// Largest first.
    Size,
}

impl SortOrder {
    /// Every order, in the sequence the UI offers them.
    pub const ALL: [Self; 4] = [Self::Newest, Self::Oldest, Self::Name, Self::Size];

    /// Stable lowercase label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Name => "name",
            Self::Size => "size",
        }
    }

    /// Human label used by list headers.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::Oldest => "Oldest",
            Self::Name => "Name",
            Self::Size => "Size",
        }
    }

    fn compare(self, a: &FileRecord, b: &FileRecord) -> Ordering {
        match self {
            Self::Newest => b.created_at_unix_ms.cmp(&a.created_at_unix_ms),
            Self::Oldest => a.created_at_unix_ms.cmp(&b.created_at_unix_ms),
            Self::Name => a
                .display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
                .then_with(|| a.display_name.cmp(&b.display_name)),
            Self::Size => b.size_bytes.cmp(&a.size_bytes),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "newest" | "recent" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "name" => Ok(Self::Name),
            "size" => Ok(Self::Size),
            other => Err(format!(
                "unknown sort order `{other}` (expected newest, oldest, name or size)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// Record field a [`FieldFilter`] targets.
pub enum FilterField {
    /// Display name.
    #[default]
    Name,
    /// Upload day.
    Date,
    /// GR serial.
    SerialNumber,
    /// Maximum size in kilobytes.
    MaxSize,
}

impl FilterField {
    /// Every field, in the sequence the UI offers them.
    pub const ALL: [Self; 4] = [Self::Name, Self::Date, Self::SerialNumber, Self::MaxSize];

    /// Stable lowercase label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Date => "date",
            Self::SerialNumber => "gr",
            Self::MaxSize => "size",
        }
    }

    /// Input placeholder for the filter value.
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Name => "File name",
            Self::Date => "YYYY-MM-DD",
            Self::SerialNumber => "GR number",
            Self::MaxSize => "Max size in KB",
        }
    }

    /// Pairs this field with a value.
    pub fn with_value(self, value: impl Into<String>) -> FieldFilter {
        let value = value.into();
        match self {
            Self::Name => FieldFilter::Name(value),
            Self::Date => FieldFilter::Date(value),
            Self::SerialNumber => FieldFilter::SerialNumber(value),
            Self::MaxSize => FieldFilter::MaxSize(value),
        }
    }
}

impl FromStr for FilterField {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "date" => Ok(Self::Date),
            "gr" | "grno" | "serial" => Ok(Self::SerialNumber),
            "size" => Ok(Self::MaxSize),
            other => Err(format!(
                "unknown filter field `{other}` (expected name, date, gr or size)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Single-field filter applied after the free-text search.
///
/// Values are kept as typed so a half-entered value simply filters nothing out.
pub enum FieldFilter {
    /// Case-insensitive substring of the display name.
    Name(String),
    /// `YYYY-MM-DD`, matched against the UTC upload day.
    Date(String),
    /// Case-insensitive substring of the serial label.
    SerialNumber(String),
    /// Decimal kilobytes; keeps records no larger than this.
    MaxSize(String),
}

impl FieldFilter {
    /// Targeted field.
    pub fn field(&self) -> FilterField {
        match self {
            Self::Name(_) => FilterField::Name,
            Self::Date(_) => FilterField::Date,
            Self::SerialNumber(_) => FilterField::SerialNumber,
            Self::MaxSize(_) => FilterField::MaxSize,
        }
    }

    /// Raw filter value.
    pub fn value(&self) -> &str {
        match self {
            Self::Name(value)
            | Self::Date(value)
            | Self::SerialNumber(value)
            | Self::MaxSize(value) => value,
        }
    }

    /// Parses `FIELD=VALUE`.
    ///
    /// # Errors
    ///
    /// Returns an error when there is no `=` or the field is unknown.
    pub fn parse_assignment(raw: &str) -> Result<Self, String> {
        let (field, value) = raw
            .split_once('=')
            .ok_or_else(|| format!("expected FIELD=VALUE, got `{raw}`"))?;
        Ok(field.parse::<FilterField>()?.with_value(value.trim()))
    }

    fn compile(&self) -> Option<CompiledFilter> {
        let value = self.value().trim();
        if value.is_empty() {
            return None;
        }
        match self {
            Self::Name(_) => Some(CompiledFilter::Name(value.to_lowercase())),
            Self::SerialNumber(_) => Some(CompiledFilter::Serial(value.to_lowercase())),
            Self::Date(_) => match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                Ok(day) => Some(CompiledFilter::Day(day)),
                Err(err) => {
                    log::debug!("ignoring invalid date filter `{value}`: {err}");
                    None
                }
            },
            Self::MaxSize(_) => match value.parse::<f64>() {
                Ok(kb) if kb.is_finite() && kb >= 0.0 => {
                    Some(CompiledFilter::MaxBytes(kb * 1024.0))
                }
                _ => {
                    log::debug!("ignoring invalid size filter `{value}`");
                    None
                }
            },
        }
    }
}

enum CompiledFilter {
    Name(String),
    Serial(String),
    Day(NaiveDate),
    MaxBytes(f64),
}

impl CompiledFilter {
    fn keeps(&self, record: &FileRecord) -> bool {
        match self {
            Self::Name(needle) => record.display_name.to_lowercase().contains(needle),
            Self::Serial(needle) => record
                .serial_number
                .as_str()
                .to_lowercase()
                .contains(needle),
            Self::Day(day) => upload_day(record) == Some(*day),
            Self::MaxBytes(limit) => record.size_bytes as f64 <= *limit,
        }
    }
}

/// UTC calendar day a record was uploaded on.
pub fn upload_day(record: &FileRecord) -> Option<NaiveDate> {
    let millis = i64::try_from(record.created_at_unix_ms).ok()?;
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// Search, optional field filter and sort order for one listing.
pub struct RecordQuery {
    /// Free text matched against name and serial.
    pub search: String,
    /// Optional field filter.
    pub filter: Option<FieldFilter>,
    /// Result order.
    pub sort: SortOrder,
}

impl RecordQuery {
    /// Query with only a sort order.
    pub fn sorted(sort: SortOrder) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    /// Sets the search text.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Sets the field filter.
    pub fn with_filter(mut self, filter: FieldFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Applies `query` to `records` without mutating them.
///
/// The sort is stable, so records that compare equal keep their input order and running the
/// same query over its own output returns it unchanged.
pub fn filter_and_sort(records: &[FileRecord], query: &RecordQuery) -> Vec<FileRecord> {
    let search = query.search.trim().to_lowercase();
    let filter = query.filter.as_ref().and_then(FieldFilter::compile);

    let mut kept: Vec<FileRecord> = records
        .iter()
        .filter(|record| {
            search.is_empty()
                || record.display_name.to_lowercase().contains(&search)
                || record
                    .serial_number
                    .as_str()
                    .to_lowercase()
                    .contains(&search)
        })
        .filter(|record| filter.as_ref().map_or(true, |filter| filter.keeps(record)))
        .cloned()
        .collect();
    kept.sort_by(|a, b| query.sort.compare(a, b));
    kept
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Count line shown above a listing.
pub struct ListingSummary {
    /// Records after filtering.
    pub shown: usize,
    /// Records before filtering.
    pub total: usize,
}

impl fmt::Display for ListingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Showing {} of {} files", self.shown, self.total)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::records::SerialNumber;

    const DAY_MS: u64 = 86_400_000;
    // 2024-03-05T00:00:00Z
    const MARCH_5: u64 = 1_709_596_800_000;

    fn record(name: &str, size: u64, created: u64, serial: &str) -> FileRecord {
        let mut record =
            FileRecord::new_file(name, size, SerialNumber::from_raw(serial), created, None);
        record.id = name.to_string();
        record
    }

    fn sample() -> Vec<FileRecord> {
        vec![
            record("report.pdf", 4096, MARCH_5 + 1_000, "GR-0001-000001"),
            record("Beach.png", 900_000, MARCH_5 + DAY_MS, "GR-0002-000002"),
            record("alpha.txt", 10, MARCH_5 - 1, "GR-0003-000003"),
            record("notes.md", 2048, MARCH_5 + 5_000, "GR-0004-000004"),
        ]
    }

    fn names(records: &[FileRecord]) -> Vec<&str> {
        records
            .iter()
            .map(|record| record.display_name.as_str())
            .collect()
    }

    #[test]
    fn default_query_sorts_newest_first_and_keeps_everything() {
        let result = filter_and_sort(&sample(), &RecordQuery::default());
        assert_eq!(
            names(&result),
            vec!["Beach.png", "notes.md", "report.pdf", "alpha.txt"]
        );
    }

    #[test]
    fn each_sort_order() {
        let records = sample();
        let run = |sort| names(&filter_and_sort(&records, &RecordQuery::sorted(sort))).join(",");
        assert_eq!(run(SortOrder::Oldest), "alpha.txt,report.pdf,notes.md,Beach.png");
        assert_eq!(run(SortOrder::Name), "alpha.txt,Beach.png,notes.md,report.pdf");
        assert_eq!(run(SortOrder::Size), "Beach.png,report.pdf,notes.md,alpha.txt");
    }

    #[test]
    fn search_matches_name_or_serial_case_insensitively() {
        let records = sample();
        let by_name = filter_and_sort(&records, &RecordQuery::default().with_search(" BEACH "));
        assert_eq!(names(&by_name), vec!["Beach.png"]);

        let by_serial = filter_and_sort(&records, &RecordQuery::default().with_search("gr-0003"));
        assert_eq!(names(&by_serial), vec!["alpha.txt"]);
    }

    #[test]
    fn date_filter_matches_utc_day_and_ignores_garbage() {
        let records = sample();
        let query = RecordQuery::sorted(SortOrder::Oldest)
            .with_filter(FieldFilter::Date("2024-03-05".to_string()));
        assert_eq!(
            names(&filter_and_sort(&records, &query)),
            vec!["report.pdf", "notes.md"]
        );

        let garbage = RecordQuery::default().with_filter(FieldFilter::Date("5th".to_string()));
        assert_eq!(filter_and_sort(&records, &garbage).len(), records.len());
    }

    #[test]
    fn size_filter_uses_kilobytes_inclusive() {
        let records = sample();
        let query = RecordQuery::sorted(SortOrder::Size)
            .with_filter(FieldFilter::MaxSize("4".to_string()));
        assert_eq!(
            names(&filter_and_sort(&records, &query)),
            vec!["report.pdf", "notes.md", "alpha.txt"]
        );

        let invalid = RecordQuery::default().with_filter(FieldFilter::MaxSize("lots".into()));
        assert_eq!(filter_and_sort(&records, &invalid).len(), 4);
    }

    #[test]
    fn blank_filter_values_are_ignored_and_search_applies_first() {
        let records = sample();
        let blank = RecordQuery::default().with_filter(FieldFilter::Name("  ".to_string()));
        assert_eq!(filter_and_sort(&records, &blank).len(), 4);

        let both = RecordQuery::default()
            .with_search("t")
            .with_filter(FieldFilter::SerialNumber("0004".to_string()));
        assert_eq!(names(&filter_and_sort(&records, &both)), vec!["notes.md"]);
    }

    #[test]
    fn filter_and_sort_is_idempotent_and_stable() {
        let mut records = sample();
        records.push(record("twin-a.txt", 10, MARCH_5 - 1, "GR-0005"));
        records.push(record("twin-b.txt", 10, MARCH_5 - 1, "GR-0006"));

        for sort in SortOrder::ALL {
            let query = RecordQuery::sorted(sort).with_search(".");
            let once = filter_and_sort(&records, &query);
            let twice = filter_and_sort(&once, &query);
            assert_eq!(once, twice, "sort={sort}");
        }

        let by_size = filter_and_sort(&records, &RecordQuery::sorted(SortOrder::Size));
        let tail: Vec<_> = names(&by_size).into_iter().rev().take(3).collect();
        assert_eq!(tail, vec!["twin-b.txt", "twin-a.txt", "alpha.txt"]);
    }

    #[test]
    fn parses_sort_orders_and_filter_assignments() {
        assert_eq!("Size".parse::<SortOrder>(), Ok(SortOrder::Size));
        assert!("largest".parse::<SortOrder>().is_err());
        assert_eq!(
            FieldFilter::parse_assignment("gr=0007"),
            Ok(FieldFilter::SerialNumber("0007".to_string()))
        );
        assert_eq!(
            FieldFilter::parse_assignment("date = 2024-01-02"),
            Ok(FieldFilter::Date("2024-01-02".to_string()))
        );
        assert!(FieldFilter::parse_assignment("colour=red").is_err());
        assert!(FieldFilter::parse_assignment("name").is_err());
    }

    #[test]
    fn summary_line() {
        let summary = ListingSummary { shown: 2, total: 5 };
        assert_eq!(summary.to_string(), "Showing 2 of 5 files");
    }
}
