//! Wall-clock time slots expressed as minutes since midnight.
//!
//! `"HH:MM"` strings are parsed here and nowhere else. Everything past this
//! boundary compares plain integers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Minutes in a day. `24:00` is accepted as an end-of-day boundary.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A half-open `[start, end)` interval of minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawSlot", into = "RawSlot")]
pub struct TimeSlot {
    start: u16,
    end: u16,
}

impl TimeSlot {
    /// Build a slot from minute-of-day values, enforcing `start < end <= 24:00`.
    pub fn new(start: u16, end: u16) -> Result<Self> {
        if end > MINUTES_PER_DAY {
            return Err(EngineError::InvalidTime(format!(
                "slot end {} is past midnight",
                format_minutes(end)
            )));
        }
        if start >= end {
            return Err(EngineError::InvalidTime(format!(
                "slot start {} is not before end {}",
                format_minutes(start),
                format_minutes(end)
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a slot from two `"HH:MM"` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_hhmm(start)?, parse_hhmm(end)?)
    }

    /// The whole day, `00:00-24:00`.
    pub fn whole_day() -> Self {
        Self {
            start: 0,
            end: MINUTES_PER_DAY,
        }
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end - self.start
    }

    /// Half-open overlap: touching slots do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &TimeSlot) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            format_minutes(self.start),
            format_minutes(self.end)
        )
    }
}

/// Parses a range such as `"08:00-12:00"` or the booking flow's `"8:00 - 16:00"`.
impl FromStr for TimeSlot {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s.split_once('-').ok_or_else(|| {
            EngineError::InvalidTime(format!("expected 'HH:MM-HH:MM', got '{}'", s))
        })?;
        Self::parse(start.trim(), end.trim())
    }
}

#[derive(Serialize, Deserialize)]
struct RawSlot {
    start: String,
    end: String,
}

impl TryFrom<RawSlot> for TimeSlot {
    type Error = EngineError;

    fn try_from(raw: RawSlot) -> Result<Self> {
        TimeSlot::parse(&raw.start, &raw.end)
    }
}

impl From<TimeSlot> for RawSlot {
    fn from(slot: TimeSlot) -> Self {
        RawSlot {
            start: format_minutes(slot.start),
            end: format_minutes(slot.end),
        }
    }
}

/// Parse `"H:MM"` or `"HH:MM"` into minutes since midnight.
pub fn parse_hhmm(s: &str) -> Result<u16> {
    let invalid = || EngineError::InvalidTime(format!("expected 'HH:MM', got '{}'", s));

    let (hours, minutes) = s.trim().split_once(':').ok_or_else(invalid)?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    // `u16::from_str` would also take a sign.
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: u16 = hours.parse().map_err(|_| invalid())?;
    let minutes: u16 = minutes.parse().map_err(|_| invalid())?;

    if minutes > 59 || hours > 24 || (hours == 24 && minutes != 0) {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}

/// Format minutes since midnight as zero-padded `"HH:MM"`.
pub fn format_minutes(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
