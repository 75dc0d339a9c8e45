//! Remote timestamp parsing.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parses a remote `updatedAt`/`dateUpdated` value.
///
/// The remote API emits RFC 3339 with a trailing `Z`; some older
/// records carry a bare datetime with no offset, which is taken as
/// UTC. Anything unparseable yields `None` rather than an error, so a
/// single bad record cannot abort a pull page.
pub fn parse_remote_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_zulu_suffix() {
        let ts = parse_remote_timestamp("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_explicit_offset() {
        let ts = parse_remote_timestamp("2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_naive_as_utc() {
        let ts = parse_remote_timestamp("2024-06-15T10:30:00.250").unwrap();
        assert_eq!(ts.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn garbage_is_none() {
        assert!(parse_remote_timestamp("").is_none());
        assert!(parse_remote_timestamp("not-a-date").is_none());
    }
}
