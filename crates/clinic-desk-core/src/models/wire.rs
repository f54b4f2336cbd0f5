//! Lenient wire encodings shared by the models.
//!
//! The backend is not strict about how it serializes dates, times and counts,
//! so decoding accepts every shape it has been seen to produce while encoding
//! always emits the canonical one.

use chrono::{NaiveDate, NaiveTime};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serializer};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M";

/// Parse `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
///
/// Only a time part introduced by `T` or a space is dropped; any other
/// trailing text makes the date invalid.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = match (raw.get(..10), raw.get(10..)) {
        (Some(date), Some(rest)) if rest.starts_with(['T', ' ']) => date,
        _ => raw,
    };
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

/// Parse `HH:MM:SS` or `HH:MM`.
pub(crate) fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, TIME_FORMAT))
        .ok()
}

pub(crate) mod date {
    use super::*;

    pub fn serialize<S: Serializer>(value: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date: {raw}")))
    }
}

pub(crate) mod time {
    use super::*;

    pub fn serialize<S: Serializer>(value: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_time(&raw).ok_or_else(|| de::Error::custom(format!("invalid time: {raw}")))
    }
}

/// Counts produced by SQL aggregates arrive either as numbers or as strings.
pub(crate) mod count {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Number(u64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match RawCount::deserialize(deserializer)? {
            RawCount::Number(n) => Ok(n),
            RawCount::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| de::Error::custom(format!("invalid count: {s}"))),
        }
    }
}
