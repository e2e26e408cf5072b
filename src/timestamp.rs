//! Calendar instants for analyzer and meteorological records.
//!
//! The analyzer exports timestamps as 14-digit `YYYYMMDDHHMMSS` codes. They are
//! parsed once into a [`Timestamp`] and every comparison or offset afterwards
//! works on real seconds rather than on the digit string.

use crate::error::{PicarroError, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar instant (UTC, second resolution)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Parse a `YYYYMMDDHHMMSS` code; a purely numeric fractional suffix (`.000`) is ignored
    pub fn from_code(code: &str) -> Result<Self> {
        let invalid = || PicarroError::InvalidTimestamp {
            value: code.to_string(),
        };

        let trimmed = code.trim();
        let digits = match trimmed.split_once('.') {
            Some((int, frac)) if frac.bytes().all(|b| b.is_ascii_digit()) => int,
            Some(_) => return Err(invalid()),
            None => trimmed,
        };

        if digits.len() != 14 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let field = |range: std::ops::Range<usize>| -> u32 {
            digits[range].parse::<u32>().unwrap_or(u32::MAX)
        };

        Self::from_ymd_hms(
            field(0..4) as i32,
            field(4..6),
            field(6..8),
            field(8..10),
            field(10..12),
            field(12..14),
        )
        .ok_or_else(invalid)
    }

    /// Parse a meteorological interval stamp such as `2021-03-14 10:20:00`
    ///
    /// Whitespace is ignored and anything after the seconds field (interval
    /// suffixes, zone markers) is dropped.
    pub fn from_interval(value: &str) -> Result<Self> {
        let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.len() < 18 || !compact.is_char_boundary(18) {
            return Err(PicarroError::InvalidTimestamp {
                value: value.to_string(),
            });
        }

        NaiveDateTime::parse_from_str(&compact[..18], "%Y-%m-%d%H:%M:%S")
            .map(Self)
            .map_err(|_| PicarroError::InvalidTimestamp {
                value: value.to_string(),
            })
    }

    /// Build from explicit calendar fields
    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(hour, minute, second)
            .map(Self)
    }

    /// Build from seconds since the Unix epoch
    pub fn from_epoch_seconds(seconds: i64) -> Option<Self> {
        DateTime::from_timestamp(seconds, 0).map(|dt| Self(dt.naive_utc()))
    }

    pub fn epoch_seconds(&self) -> i64 {
        self.0.and_utc().timestamp()
    }

    /// Signed number of seconds from `earlier` to `self`
    pub fn seconds_since(&self, earlier: Timestamp) -> i64 {
        self.epoch_seconds() - earlier.epoch_seconds()
    }

    /// The sortable 14-digit integer code used in exports
    pub fn code(&self) -> i64 {
        let dt = &self.0;
        (dt.year() as i64) * 10_000_000_000
            + (dt.month() as i64) * 100_000_000
            + (dt.day() as i64) * 1_000_000
            + (dt.hour() as i64) * 10_000
            + (dt.minute() as i64) * 100
            + dt.second() as i64
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn as_datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

impl FromStr for Timestamp {
    type Err = PicarroError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_code(s)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:014}", self.code())
    }
}
