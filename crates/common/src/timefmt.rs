//! Canonical rendering of protobuf duration and timestamp wire types.
//!
//! The same instant must always render to the same string, otherwise the
//! surrounding diff machinery reports spurious changes on every plan.

use chrono::{TimeZone, Utc};

use crate::error::{Error, Result};

const NANOS_PER_SEC: i64 = 1_000_000_000;
const NANOS_PER_MILLI: i64 = 1_000_000;

/// Render a protobuf duration to its canonical string form.
///
/// Whole seconds render as `"3s"`, sub-second components are appended in
/// milliseconds (`"1s500ms"`, `"250ms"`). The zero duration renders as
/// `"0s"`.
pub fn format_duration(d: &prost_types::Duration) -> String {
    let total_nanos = d.seconds * NANOS_PER_SEC + d.nanos as i64;
    if total_nanos == 0 {
        return "0s".to_string();
    }

    let secs = total_nanos / NANOS_PER_SEC;
    let millis = (total_nanos % NANOS_PER_SEC) / NANOS_PER_MILLI;

    match (secs, millis) {
        (0, ms) => format!("{}ms", ms),
        (s, 0) => format!("{}s", s),
        (s, ms) => format!("{}s{}ms", s, ms),
    }
}

/// Parse a duration string of the form `[Nh][Nm][Ns][Nms]` into a
/// protobuf duration. At least one component is required.
pub fn parse_duration(input: &str) -> Result<prost_types::Duration> {
    let s = input.trim();
    if s.is_empty() {
        return Err(Error::InvalidConfig("empty duration".to_string()));
    }

    let mut total_nanos: i64 = 0;
    let mut number = String::new();
    let mut matched = false;
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        if number.is_empty() {
            return Err(Error::InvalidConfig(format!("invalid duration {:?}", input)));
        }
        let value: i64 = number
            .parse()
            .map_err(|_| Error::InvalidConfig(format!("invalid duration {:?}", input)))?;
        number.clear();

        let unit_nanos = match c {
            'h' => 3600 * NANOS_PER_SEC,
            's' => NANOS_PER_SEC,
            'm' => {
                if chars.peek() == Some(&'s') {
                    chars.next();
                    NANOS_PER_MILLI
                } else {
                    60 * NANOS_PER_SEC
                }
            }
            _ => {
                return Err(Error::InvalidConfig(format!(
                    "invalid duration unit {:?} in {:?}",
                    c, input
                )))
            }
        };
        total_nanos += value * unit_nanos;
        matched = true;
    }

    if !number.is_empty() || !matched {
        return Err(Error::InvalidConfig(format!("invalid duration {:?}", input)));
    }

    Ok(prost_types::Duration {
        seconds: total_nanos / NANOS_PER_SEC,
        nanos: (total_nanos % NANOS_PER_SEC) as i32,
    })
}

/// Render a protobuf timestamp as RFC 3339 in UTC.
///
/// Out-of-range timestamps are rendered as an empty string rather than
/// panicking; the caller omits the attribute in that case.
pub fn format_timestamp(ts: &prost_types::Timestamp) -> String {
    match Utc.timestamp_opt(ts.seconds, ts.nanos.max(0) as u32) {
        chrono::LocalResult::Single(dt) => dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dur(seconds: i64, nanos: i32) -> prost_types::Duration {
        prost_types::Duration { seconds, nanos }
    }

    #[test]
    fn duration_rendering_is_canonical() {
        assert_eq!(format_duration(&dur(0, 0)), "0s");
        assert_eq!(format_duration(&dur(3, 0)), "3s");
        assert_eq!(format_duration(&dur(0, 250_000_000)), "250ms");
        assert_eq!(format_duration(&dur(1, 500_000_000)), "1s500ms");
        assert_eq!(format_duration(&dur(90, 0)), "90s");
    }

    #[test]
    fn duration_round_trips_through_parse() {
        for text in ["3s", "250ms", "1s500ms", "90s"] {
            let d = parse_duration(text).unwrap();
            assert_eq!(format_duration(&d), text);
        }
    }

    #[test]
    fn parse_accepts_minute_and_hour_units() {
        assert_eq!(parse_duration("1m30s").unwrap(), dur(90, 0));
        assert_eq!(parse_duration("2h").unwrap(), dur(7200, 0));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("s10").is_err());
        assert!(parse_duration("10x").is_err());
    }

    #[test]
    fn timestamp_rendering_is_stable() {
        let ts = prost_types::Timestamp {
            seconds: 1_700_000_000,
            nanos: 0,
        };
        let first = format_timestamp(&ts);
        assert_eq!(first, format_timestamp(&ts));
        assert_eq!(first, "2023-11-14T22:13:20Z");
    }
}
