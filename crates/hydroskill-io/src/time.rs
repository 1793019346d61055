//! Cell parsers shared by the CSV readers.

use chrono::{DateTime, NaiveDateTime, Utc};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse an RFC 3339 timestamp, or a naive one taken as UTC. A bare date is
/// midnight.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(t.and_utc());
        }
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

/// Parse a value cell. Empty cells and `NaN` are gaps (`Some(NaN)`);
/// infinities and garbage are rejected (`None`).
pub(crate) fn parse_value(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(f64::NAN);
    }
    let value: f64 = raw.parse().ok()?;
    if value.is_infinite() { None } else { Some(value) }
}

/// Parse a coordinate cell, which must be finite.
pub(crate) fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_formats() {
        let expected = DateTime::from_timestamp(1_483_228_800 + 3_600, 0).unwrap();
        assert_eq!(parse_timestamp("2017-01-01T01:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2017-01-01T02:00:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2017-01-01 01:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2017-01-01T01:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2017-01-01 01:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2017-01-01"),
            DateTime::from_timestamp(1_483_228_800, 0)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn value_gaps_and_rejections() {
        assert!(parse_value("").unwrap().is_nan());
        assert!(parse_value("NaN").unwrap().is_nan());
        assert_eq!(parse_value(" 1.5 "), Some(1.5));
        assert_eq!(parse_value("inf"), None);
        assert_eq!(parse_value("abc"), None);
    }

    #[test]
    fn coordinates_must_be_finite() {
        assert_eq!(parse_coordinate("3.25"), Some(3.25));
        assert_eq!(parse_coordinate(""), None);
        assert_eq!(parse_coordinate("NaN"), None);
    }
}
