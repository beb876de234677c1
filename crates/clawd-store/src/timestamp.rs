//! Timestamp decoding for the memory documents.
//!
//! New documents are written with RFC 3339 timestamps.  Older documents may
//! carry ISO 8601 timestamps without an offset (`2024-05-01T10:00:00.123456`);
//! those are read as local wall-clock time.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde::de::{self, Deserializer};

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse an RFC 3339 timestamp, or an offset-less ISO timestamp taken as
/// local time.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT).ok()?;
    // A wall-clock time skipped by a DST jump has no local mapping.
    Some(match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => naive.and_utc(),
    })
}

/// `deserialize_with` target for `DateTime<Utc>` fields.
pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_keeps_its_offset() {
        let ts = parse("2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn naive_timestamps_are_local_time() {
        let naive =
            NaiveDateTime::parse_from_str("2024-05-01T10:00:00.123456", NAIVE_FORMAT).unwrap();
        let expected = Local
            .from_local_datetime(&naive)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(parse("2024-05-01T10:00:00.123456"), Some(expected));
        // Fraction is optional.
        assert!(parse("2024-05-01T10:00:00").is_some());
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse("yesterday"), None);
        assert_eq!(parse(""), None);
    }
}
