//! Timestamp parsing for event tables.

use chrono::{NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp; date-only values resolve to midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Canonical rendering used in every output table.
pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_formats() {
        let expected = NaiveDate::from_ymd_opt(2180, 7, 23)
            .unwrap()
            .and_hms_opt(12, 35, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2180-07-23 12:35:00"), Some(expected));
        assert_eq!(parse_timestamp("2180-07-23T12:35:00"), Some(expected));
        assert_eq!(parse_timestamp("2180-07-23 12:35"), Some(expected));
        assert_eq!(parse_timestamp(" 2180-07-23 12:35:00.000 "), Some(expected));
    }

    #[test]
    fn test_date_only_is_midnight() {
        let parsed = parse_timestamp("2024-02-29").unwrap();
        assert_eq!(format_timestamp(parsed), "2024-02-29 00:00:00");
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("07/23/2180"), None);
        assert_eq!(parse_timestamp("2024-13-01"), None);
    }
}
