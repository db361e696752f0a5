//! Date parsing for the formats the DSO mixes freely.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Epoch values above this are milliseconds rather than seconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Parse a date or timestamp from text.
///
/// Naive values are taken as UTC; bare dates as midnight UTC. Brazilian
/// `dd/mm/yyyy` is accepted; `mm/dd/yyyy` is not.
#[must_use]
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(Utc.from_utc_datetime(&dt));
    }

    // Date-only values, possibly followed by a time we could not read
    let date_part = s.split(['T', ' ']).next().unwrap_or(s);
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
    {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt));
    }

    s.parse::<i64>().ok().and_then(from_epoch)
}

/// Parse a date from a JSON string or epoch number.
#[must_use]
pub fn parse_date_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date(s),
        Value::Number(n) => n.as_i64().and_then(from_epoch),
        _ => None,
    }
}

fn from_epoch(n: i64) -> Option<DateTime<Utc>> {
    if n.abs() >= MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(n)
    } else {
        DateTime::from_timestamp(n, 0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;
    use serde_json::json;

    use super::*;

    fn ymd(dt: Option<DateTime<Utc>>) -> Option<(i32, u32, u32)> {
        dt.map(|d| (d.year(), d.month(), d.day()))
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!(ymd(parse_date("2024-03-15T10:00:00Z")), Some((2024, 3, 15)));
        assert_eq!(ymd(parse_date("2024-03-15T10:00:00-03:00")), Some((2024, 3, 15)));
        assert_eq!(ymd(parse_date("2024-03-15 10:00:00")), Some((2024, 3, 15)));
        assert_eq!(ymd(parse_date("2024-03-15")), Some((2024, 3, 15)));
        assert_eq!(ymd(parse_date("15/03/2024")), Some((2024, 3, 15)));
        assert_eq!(ymd(parse_date("15/03/2024 08:30")), Some((2024, 3, 15)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("ontem"), None);
        assert_eq!(parse_date("03/15/2024"), None);
    }

    #[test]
    fn test_epoch_seconds_and_millis() {
        assert_eq!(ymd(parse_date_value(&json!(1_710_460_800))), Some((2024, 3, 15)));
        assert_eq!(
            ymd(parse_date_value(&json!(1_710_460_800_000_i64))),
            Some((2024, 3, 15))
        );
        assert_eq!(parse_date_value(&json!(null)), None);
    }
}
