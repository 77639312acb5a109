//! Non-reactive helpers behind the files view.

use vault_host::{
    encode_data_url, filter_and_sort, format_file_size, format_timestamp, mime_for_name,
    FileRecord, FilterField, ListingSummary, MediaKind, PreviewAction, RecordQuery, SortOrder,
};

/// Builds the listing query from the raw control values.
pub fn build_query(
    search: &str,
    filter_field: FilterField,
    filter_value: &str,
    sort: SortOrder,
) -> RecordQuery {
    let query = RecordQuery::sorted(sort).with_search(search);
    if filter_value.trim().is_empty() {
        query
    } else {
        query.with_filter(filter_field.with_value(filter_value))
    }
}

/// Visible rows plus the count line.
pub fn listing(records: &[FileRecord], query: &RecordQuery) -> (Vec<FileRecord>, ListingSummary) {
    let visible = filter_and_sort(records, query);
    let summary = ListingSummary {
        shown: visible.len(),
        total: records.len(),
    };
    (visible, summary)
}

/// Secondary line under a row's name.
pub fn row_details(record: &FileRecord) -> String {
    format!(
        "{} | {} | {}",
        record.serial_number,
        format_file_size(record.size_bytes),
        format_timestamp(record.created_at_unix_ms)
    )
}

/// Whether `id` is still the open record; late async results for other rows are dropped.
pub fn is_current_selection(selected: Option<&FileRecord>, id: &str) -> bool {
    selected.is_some_and(|record| record.id == id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// What the preview panel renders.
pub enum PreviewContent {
    /// `<img>` source.
    Image(String),
    /// `<video>` source.
    Video(String),
    /// `<audio>` source.
    Audio(String),
    /// Embedded PDF source.
    Pdf(String),
    /// Decoded text.
    Text(String),
    /// Offered as a download only.
    Download {
        /// Data URL handed to the download anchor.
        href: String,
        /// Why the file is not rendered in place.
        reason: &'static str,
    },
    /// Record has no stored bytes.
    Unavailable,
}

/// Chooses what to render for `record` given its bytes.
pub fn preview_content(record: &FileRecord, bytes: Option<Vec<u8>>) -> PreviewContent {
    let Some(action) = PreviewAction::for_record(record) else {
        return PreviewContent::Unavailable;
    };
    let Some(bytes) = bytes else {
        return PreviewContent::Unavailable;
    };
    let href = encode_data_url(mime_for_name(&record.display_name), &bytes);
    match action {
        PreviewAction::Inline(MediaKind::Image) => PreviewContent::Image(href),
        PreviewAction::Inline(MediaKind::Video) => PreviewContent::Video(href),
        PreviewAction::Inline(MediaKind::Audio) => PreviewContent::Audio(href),
        PreviewAction::Inline(MediaKind::Pdf) => PreviewContent::Pdf(href),
        PreviewAction::Inline(MediaKind::Document | MediaKind::Code) => {
            match String::from_utf8(bytes) {
                Ok(text) => PreviewContent::Text(text),
                Err(_) => PreviewContent::Download {
                    href,
                    reason: "This document is not plain text.",
                },
            }
        }
        PreviewAction::Inline(MediaKind::Office | MediaKind::Unknown)
        | PreviewAction::Download => PreviewContent::Download {
            href,
            reason: download_reason(&record.display_name),
        },
    }
}

fn download_reason(name: &str) -> &'static str {
    match MediaKind::from_name(name) {
        MediaKind::Office => "Office documents open in a desktop application.",
        MediaKind::Document => "This document is not plain text.",
        _ => "Preview is not available for this file type.",
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use vault_host::{FieldFilter, FileKind, SerialNumber};

    use super::*;

    fn record(name: &str, size: u64, created: u64) -> FileRecord {
        FileRecord::new_file(name, size, SerialNumber::from_raw("GR-0001-000001"), created, None)
    }

    #[test]
    fn query_skips_blank_filter_values() {
        let query = build_query("abc", FilterField::Date, "  ", SortOrder::Oldest);
        assert_eq!(query.filter, None);
        assert_eq!(query.search, "abc");
        assert_eq!(query.sort, SortOrder::Oldest);

        let query = build_query("", FilterField::MaxSize, "10", SortOrder::Newest);
        assert_eq!(query.filter, Some(FieldFilter::MaxSize("10".to_string())));
    }

    #[test]
    fn listing_counts_shown_against_total() {
        let records = vec![record("a.txt", 1, 1), record("b.png", 2, 2)];
        let query = build_query("png", FilterField::Name, "", SortOrder::Newest);
        let (visible, summary) = listing(&records, &query);
        assert_eq!(visible.len(), 1);
        assert_eq!(summary.to_string(), "Showing 1 of 2 files");
    }

    #[test]
    fn row_details_show_serial_size_and_time() {
        let row = row_details(&record("a.txt", 1536, 1_709_596_800_000));
        assert_eq!(row, "GR-0001-000001 | 1.5 KB | 2024-03-05 00:00:00");
    }

    #[test]
    fn late_preview_for_a_previous_selection_is_ignored() {
        let first = record("first.txt", 1, 1);
        let second = record("second.png", 2, 2);

        // `first` was opened, then `second` before first's bytes arrived.
        let current = Some(&second);
        assert!(!is_current_selection(current, &first.id));
        assert!(is_current_selection(current, &second.id));
        assert!(!is_current_selection(None, &first.id));
    }

    #[test]
    fn preview_dispatch_by_media_kind() {
        let png = preview_content(&record("a.png", 3, 0), Some(vec![1, 2, 3]));
        assert_eq!(png, PreviewContent::Image("data:image/png;base64,AQID".to_string()));

        let text = preview_content(&record("notes.md", 2, 0), Some(b"hi".to_vec()));
        assert_eq!(text, PreviewContent::Text("hi".to_string()));

        let binary_doc = preview_content(&record("a.txt", 1, 0), Some(vec![0xff]));
        assert!(matches!(binary_doc, PreviewContent::Download { .. }));

        let deck = preview_content(&record("deck.pptx", 1, 0), Some(vec![0]));
        assert_eq!(
            deck,
            PreviewContent::Download {
                href: "data:application/vnd.openxmlformats-officedocument.presentationml.presentation;base64,AA==".to_string(),
                reason: "Office documents open in a desktop application.",
            }
        );

        let zip = preview_content(&record("a.zip", 1, 0), Some(vec![0]));
        assert!(matches!(zip, PreviewContent::Download { .. }));

        assert_eq!(
            preview_content(&record("a.png", 0, 0), None),
            PreviewContent::Unavailable
        );

        let mut folder = record("Projects", 0, 0);
        folder.kind = FileKind::Folder;
        assert_eq!(
            preview_content(&folder, Some(Vec::new())),
            PreviewContent::Unavailable
        );
    }
}
