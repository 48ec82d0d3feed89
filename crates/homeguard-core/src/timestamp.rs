//! Timestamp parsing for registry files.
//!
//! Current files carry RFC 3339 timestamps. Older files carry naive ISO 8601
//! local times such as `2026-03-01T10:00:00.123456`; those are read as local
//! time.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Parse an RFC 3339 timestamp, or a naive ISO 8601 one in local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    // A local time skipped by a DST jump has no mapping; fall back to UTC.
    Some(
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc()),
    )
}

/// `deserialize_with` for a required timestamp.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp {raw:?}")))
}

/// `deserialize_with` for an optional timestamp.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp {raw:?}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn parses_rfc3339() {
        let dt = parse_timestamp("2026-03-01T10:00:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn naive_time_is_local() {
        let dt = parse_timestamp("2026-03-01T10:00:00.123456").unwrap();
        let expected = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_micro_opt(10, 0, 0, 123_456)
            .unwrap();
        assert_eq!(dt.with_timezone(&Local).naive_local(), expected);
    }

    #[test]
    fn naive_time_without_fraction() {
        let dt = parse_timestamp("2026-03-01T10:00:00").unwrap();
        assert_eq!(
            dt.with_timezone(&Local).naive_local(),
            NaiveDate::from_ymd_opt(2026, 3, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
