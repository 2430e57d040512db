//! Conversion of raw probe payloads into reports.

use chrono::{DateTime, Utc};

use crate::db::{Downtime, NewReport};
use crate::probe::{EpochValue, RawDiagnosticPayload, RawDowntime};

/// Bind a raw payload to a station, converting downtimes to timestamps.
///
/// Storage, tuner, security and error sections are copied as-is.
pub fn normalize(raw: RawDiagnosticPayload, station_id: i64) -> NewReport {
    let downtimes = raw
        .downtimes
        .unwrap_or_default()
        .iter()
        .map(convert_downtime)
        .collect();

    NewReport {
        station_id,
        disks: raw.storage.disks,
        cards: raw.storage.cards,
        hdhomerun_devices: raw.hdhomerun_devices,
        security: raw.security,
        errors: raw.errors,
        downtimes,
    }
}

fn convert_downtime(raw: &RawDowntime) -> Downtime {
    Downtime {
        start: epoch_to_time(&raw.start),
        end: epoch_to_time(&raw.end),
    }
}

/// Epoch seconds to a point in time; `None` if the value is not a usable integer.
fn epoch_to_time(value: &EpochValue) -> Option<DateTime<Utc>> {
    let millis = epoch_seconds(value)?.checked_mul(1000)?;
    DateTime::from_timestamp_millis(millis)
}

fn epoch_seconds(value: &EpochValue) -> Option<i64> {
    match value {
        EpochValue::Integer(n) => Some(*n),
        EpochValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        EpochValue::Float(_) => None,
        EpochValue::Text(s) => parse_leading_int(s),
        EpochValue::Other(_) => None,
    }
}

/// Leading-integer parse: skips leading whitespace, takes an optional sign and
/// the digits that follow, and ignores the rest. A `0x`/`0X` prefix switches to
/// hex digits.
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, rest) = match rest.get(..2) {
        Some("0x" | "0X") => (16, &rest[2..]),
        _ => (10, rest),
    };

    let digits_end = rest
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }

    let magnitude = i64::from_str_radix(&rest[..digits_end], radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
