//! Contest time handling.
//!
//! clist.by reports times as naive UTC timestamps (`2024-10-12T16:35:00`).
//! Durations are rendered the way the bot has always shown them:
//! `H:MM:SS`, with a `N day(s), ` prefix once they exceed 24 hours.

use crate::CoreError;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Timestamp format used by the clist API, both in queries and responses.
pub const CLIST_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a clist timestamp into UTC.
///
/// Falls back to RFC 3339 for responses that carry an explicit offset.
pub fn parse_clist_time(value: &str) -> Result<DateTime<Utc>, CoreError> {
    match NaiveDateTime::parse_from_str(value, CLIST_DATE_FORMAT) {
        Ok(naive) => Ok(naive.and_utc()),
        Err(e) => DateTime::parse_from_rfc3339(value)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| CoreError::InvalidTime {
                value: value.to_string(),
                reason: e.to_string(),
            }),
    }
}

/// Format a UTC instant for a clist query parameter.
pub fn format_clist_time(time: &DateTime<Utc>) -> String {
    time.format(CLIST_DATE_FORMAT).to_string()
}

/// Round to the nearest whole minute.
pub fn round_to_nearest_minute(delta: Duration) -> Duration {
    let minutes = (delta.num_milliseconds() as f64 / 60_000.0).round() as i64;
    Duration::minutes(minutes)
}

/// Render as `H:MM:SS`, e.g. `2:00:00` or `1 day, 0:30:00`.
pub fn format_delta(delta: Duration) -> String {
    let (prefix, h, m, s) = split(delta);
    format!("{}{}:{:02}:{:02}", prefix, h, m, s)
}

/// Render as `H:MM`, dropping seconds, e.g. `2:30` or `3 days, 0:00`.
pub fn format_duration(delta: Duration) -> String {
    let (prefix, h, m, _) = split(delta);
    format!("{}{}:{:02}", prefix, h, m)
}

// Negative durations render as zero.
fn split(delta: Duration) -> (String, i64, i64, i64) {
    let total = delta.num_seconds().max(0);
    let days = total / 86_400;
    let rest = total % 86_400;
    let prefix = match days {
        0 => String::new(),
        1 => "1 day, ".to_string(),
        n => format!("{} days, ", n),
    };
    (prefix, rest / 3600, (rest % 3600) / 60, rest % 60)
}

/// Serde adapter for clist timestamps.
pub mod clist_time {
    use super::{format_clist_time, parse_clist_time};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_clist_time(time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_clist_time(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_clist_time() {
        let t = parse_clist_time("2024-10-12T16:35:00").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 10, 12, 16, 35, 0).unwrap());
    }

    #[test]
    fn test_parse_clist_time_with_offset() {
        let t = parse_clist_time("2024-10-12T18:35:00+02:00").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 10, 12, 16, 35, 0).unwrap());
    }

    #[test]
    fn test_parse_clist_time_invalid() {
        assert!(parse_clist_time("12.10.2024 16:35").is_err());
    }

    #[test]
    fn test_format_clist_time() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_clist_time(&t), "2024-01-02T03:04:05");
    }

    #[test]
    fn test_round_to_nearest_minute() {
        assert_eq!(
            round_to_nearest_minute(Duration::seconds(7_229)),
            Duration::minutes(120)
        );
        assert_eq!(
            round_to_nearest_minute(Duration::seconds(7_171)),
            Duration::minutes(120)
        );
        assert_eq!(
            round_to_nearest_minute(Duration::seconds(7_140)),
            Duration::minutes(119)
        );
    }

    #[test]
    fn test_format_delta() {
        assert_eq!(format_delta(Duration::hours(2)), "2:00:00");
        assert_eq!(format_delta(Duration::minutes(1_470)), "1 day, 0:30:00");
        assert_eq!(format_delta(Duration::days(3) + Duration::seconds(5)), "3 days, 0:00:05");
        assert_eq!(format_delta(Duration::seconds(-30)), "0:00:00");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::minutes(150)), "2:30");
        assert_eq!(format_duration(Duration::days(10)), "10 days, 0:00");
    }
}
