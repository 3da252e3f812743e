//! Date handling for post files.
//!
//! Front matter stores local wall-clock time (`YYYY-MM-DD HH:MM:SS`), the
//! API reports ISO-8601 UTC with milliseconds, and the editor form uses
//! `YYYY-MM-DDTHH:MM`.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use regex::Regex;
use serde_yaml::Value;
use std::sync::OnceLock;
use std::time::SystemTime;

const FRONT_MATTER_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILENAME_FORMAT: &str = "%Y-%m-%d";
const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Current local time.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn ymd_hms(parts: [u32; 6]) -> Option<NaiveDateTime> {
    let [year, month, day, hour, minute, second] = parts;
    NaiveDate::from_ymd_opt(year as i32, month, day)?.and_hms_opt(hour, minute, second)
}

/// Parse the editor form's `YYYY-MM-DDTHH:MM` value.
pub fn parse_input_date(value: &str) -> Option<NaiveDateTime> {
    static INPUT: OnceLock<Regex> = OnceLock::new();
    let input = INPUT.get_or_init(|| {
        Regex::new(r"(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2})").expect("valid regex")
    });

    let caps = input.captures(value)?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    ymd_hms([field(1)?, field(2)?, field(3)?, field(4)?, field(5)?, 0])
}

/// Parse any date a post might carry, as local time.
///
/// Accepts RFC 3339 (converted to local time), then `YYYY-MM-DD` with an
/// optional `[T ]HH:MM[:SS]` read as local time.
pub fn parse_date_value(value: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value.trim()) {
        return Some(parsed.with_timezone(&Local).naive_local());
    }

    static LOOSE: OnceLock<Regex> = OnceLock::new();
    let loose = LOOSE.get_or_init(|| {
        Regex::new(r"(\d{4})-(\d{2})-(\d{2})(?:[T\s](\d{2}):(\d{2})(?::(\d{2}))?)?")
            .expect("valid regex")
    });

    if let Some(caps) = loose.captures(value) {
        let field = |i: usize, default: u32| {
            caps.get(i)
                .map_or(Some(default), |m| m.as_str().parse::<u32>().ok())
        };
        return ymd_hms([
            field(1, 0)?,
            field(2, 0)?,
            field(3, 0)?,
            field(4, 0)?,
            field(5, 0)?,
            field(6, 0)?,
        ]);
    }
    None
}

/// Date stored in a front matter value.
pub fn from_front_matter(value: Option<&Value>) -> Option<NaiveDateTime> {
    match value? {
        Value::String(text) => parse_date_value(text),
        _ => None,
    }
}

pub fn format_front_matter(date: NaiveDateTime) -> String {
    date.format(FRONT_MATTER_FORMAT).to_string()
}

/// `YYYY-MM-DD` prefix of a published post's filename.
pub fn format_filename(date: NaiveDateTime) -> String {
    date.format(FILENAME_FORMAT).to_string()
}

/// Local time as ISO-8601 UTC with milliseconds.
pub fn to_iso(date: NaiveDateTime) -> String {
    let utc = match Local.from_local_datetime(&date).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Skipped by a DST transition: read it as UTC
        None => Utc.from_utc_datetime(&date),
    };
    utc.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// File modification time as ISO-8601 UTC with milliseconds.
pub fn system_time_to_iso(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Milliseconds since the epoch of an ISO timestamp; 0 when unparseable.
pub fn iso_timestamp(value: Option<&str>) -> i64 {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map_or(0, |parsed| parsed.timestamp_millis())
}

/// Editor form value for an ISO timestamp, in local time.
///
/// Unparseable input yields an empty string.
pub fn input_value_from_iso(value: &str) -> String {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Local).format(INPUT_FORMAT).to_string())
        .unwrap_or_default()
}

/// Editor form value for a local time.
pub fn input_value(date: NaiveDateTime) -> String {
    date.format(INPUT_FORMAT).to_string()
}

/// Date shown on a post card.
pub fn display_date(value: Option<&str>) -> String {
    match value {
        None | Some("") => "No date".to_string(),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|parsed| parsed.with_timezone(&Local).format(DISPLAY_FORMAT).to_string())
            .unwrap_or_else(|_| raw.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_input_date() {
        assert_eq!(
            parse_input_date("2024-03-05T14:30"),
            Some(at(2024, 3, 5, 14, 30, 0))
        );
        assert_eq!(parse_input_date("2024-03-05"), None);
        assert_eq!(parse_input_date("2024-13-05T14:30"), None);
        assert_eq!(parse_input_date(""), None);
    }

    #[test]
    fn test_parse_date_value_variants() {
        assert_eq!(parse_date_value("2024-03-05"), Some(at(2024, 3, 5, 0, 0, 0)));
        assert_eq!(
            parse_date_value("2024-03-05 08:09:10 +0000"),
            Some(at(2024, 3, 5, 8, 9, 10))
        );
        assert_eq!(
            parse_date_value("2024-03-05T08:09"),
            Some(at(2024, 3, 5, 8, 9, 0))
        );
        assert_eq!(parse_date_value("not a date"), None);
    }

    #[test]
    fn test_formats() {
        let date = at(2024, 1, 2, 3, 4, 5);
        assert_eq!(format_front_matter(date), "2024-01-02 03:04:05");
        assert_eq!(format_filename(date), "2024-01-02");
        assert_eq!(input_value(date), "2024-01-02T03:04");
    }

    #[test]
    fn test_iso_roundtrips_through_local_time() {
        let date = at(2024, 6, 1, 12, 0, 0);
        let iso = to_iso(date);
        assert!(iso.ends_with(".000Z"));
        assert_eq!(input_value_from_iso(&iso), "2024-06-01T12:00");
        assert_eq!(parse_date_value(&iso).map(input_value), Some(input_value(date)));
    }

    #[test]
    fn test_iso_timestamp_orders_dates() {
        let older = to_iso(at(2023, 1, 1, 0, 0, 0));
        let newer = to_iso(at(2024, 1, 1, 0, 0, 0));
        assert!(iso_timestamp(Some(&newer)) > iso_timestamp(Some(&older)));
        assert_eq!(iso_timestamp(None), 0);
        assert_eq!(iso_timestamp(Some("garbage")), 0);
    }

    #[test]
    fn test_display_date() {
        assert_eq!(display_date(None), "No date");
        assert_eq!(display_date(Some("someday")), "someday");
        let iso = to_iso(at(2024, 6, 1, 12, 30, 0));
        assert_eq!(display_date(Some(&iso)), "2024-06-01 12:30");
    }

    #[test]
    fn test_front_matter_value() {
        let value = Value::String("2024-02-03 04:05:06".to_string());
        assert_eq!(from_front_matter(Some(&value)), Some(at(2024, 2, 3, 4, 5, 6)));
        assert_eq!(from_front_matter(Some(&Value::Null)), None);
        assert_eq!(from_front_matter(None), None);
    }
}
