//! Wall-clock primitives.
//!
//! Times are minutes since local midnight (0..=1439) parsed from strict
//! 24-hour `HH:MM`; dates are ISO `YYYY-MM-DD` local dates. There is no
//! timezone handling anywhere in the core -- everything is the host's local
//! wall clock.

use chrono::{Local, NaiveDate};

use crate::error::TimeError;

/// Minutes in one local day.
pub const MINUTES_PER_DAY: u32 = 1440;

/// Parse a strict `HH:MM` string into minutes since midnight.
///
/// Accepts exactly two zero-padded digit pairs separated by a colon, with
/// hours 00..=23 and minutes 00..=59. Everything else is a [`TimeError`].
pub fn parse_hhmm(input: &str) -> Result<u32, TimeError> {
    let bytes = input.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return bad_time(input);
    }
    if !bytes[0].is_ascii_digit()
        || !bytes[1].is_ascii_digit()
        || !bytes[3].is_ascii_digit()
        || !bytes[4].is_ascii_digit()
    {
        return bad_time(input);
    }

    let hours = (bytes[0] - b'0') as u32 * 10 + (bytes[1] - b'0') as u32;
    let minutes = (bytes[3] - b'0') as u32 * 10 + (bytes[4] - b'0') as u32;
    if hours > 23 || minutes > 59 {
        return bad_time(input);
    }

    Ok(hours * 60 + minutes)
}

fn bad_time(input: &str) -> Result<u32, TimeError> {
    Err(TimeError::BadTime {
        input: input.to_string(),
    })
}

/// Format minutes since midnight as zero-padded `HH:MM`.
///
/// Values at or past 24:00 wrap into the next day, so extended-coordinate
/// minutes produced by a midnight-crossing awake window format as their
/// clock-face time.
pub fn format_hhmm(minutes: u32) -> String {
    let day_minutes = minutes % MINUTES_PER_DAY;
    format!("{:02}:{:02}", day_minutes / 60, day_minutes % 60)
}

/// Parse an ISO `YYYY-MM-DD` local date.
pub fn parse_date(input: &str) -> Result<NaiveDate, TimeError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| TimeError::BadDate {
        input: input.to_string(),
    })
}

/// Format a local date as ISO `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// The host's local calendar date.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whether `date` is the host's local today.
pub fn is_today(date: NaiveDate) -> bool {
    date == local_today()
}

/// Serde adapter serializing minutes since midnight as `HH:MM`.
///
/// Used on schedule block fields so the wire format matches the persisted
/// JSON contract while arithmetic stays on plain integers.
pub mod serde_hhmm {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_hhmm, parse_hhmm};

    pub fn serialize<S: Serializer>(minutes: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_hhmm(*minutes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_hhmm(&raw).map_err(serde::de::Error::custom)
    }
}
