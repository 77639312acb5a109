//! Display helpers for sizes and timestamps.

use chrono::DateTime;

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Formats a byte count with 1024-based units and at most two decimals.
///
/// `0` renders as `0 Bytes`; trailing zeros are dropped (`1.5 KB`, not `1.50 KB`).
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    let mut text = format!("{rounded:.2}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    format!("{text} {}", SIZE_UNITS[unit])
}

/// Formats a unix millisecond timestamp as `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_timestamp(unix_ms: u64) -> String {
    i64::try_from(unix_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "Invalid Date".to_string())
}

/// Formats the UTC calendar day of a unix millisecond timestamp as `YYYY-MM-DD`.
pub fn format_date(unix_ms: u64) -> String {
    i64::try_from(unix_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Invalid Date".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1_048_576), "1 MB");
        assert_eq!(format_file_size(1_234_567_890), "1.15 GB");
        assert_eq!(format_file_size(u64::MAX), "16777216 TB");
    }

    #[test]
    fn timestamps_render_in_utc() {
        assert_eq!(format_timestamp(1_709_596_800_000), "2024-03-05 00:00:00");
        assert_eq!(format_date(1_709_596_800_000 + 86_399_999), "2024-03-05");
        assert_eq!(format_timestamp(u64::MAX), "Invalid Date");
    }
}
