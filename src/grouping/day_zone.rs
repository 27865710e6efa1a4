//! Calendar-day resolution.
//!
//! Two notifications only share a group when they fall on the same
//! calendar day, and which day that is depends on the viewer's timezone.

use super::error::GroupingError;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};
use std::fmt;
use std::str::FromStr;

/// Timezone in which calendar days are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayZone {
    /// The process's local timezone.
    #[default]
    Local,
    /// A fixed UTC offset.
    Fixed(FixedOffset),
}

impl DayZone {
    pub fn utc() -> Self {
        DayZone::Fixed(Utc.fix())
    }

    /// Returns the calendar day `at` falls on in this zone.
    pub fn day_of(&self, at: &DateTime<Utc>) -> NaiveDate {
        match self {
            DayZone::Local => at.with_timezone(&Local).date_naive(),
            DayZone::Fixed(offset) => at.with_timezone(offset).date_naive(),
        }
    }
}

impl FromStr for DayZone {
    type Err = GroupingError;

    /// Accepts `local`, `utc`/`z`, or an offset such as `+02:00`, `-0530` or `+9`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || GroupingError::InvalidZone(s.to_string());

        match trimmed.to_lowercase().as_str() {
            "local" => return Ok(DayZone::Local),
            "utc" | "z" => return Ok(DayZone::utc()),
            _ => {}
        }

        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(invalid()),
        };

        let (hours, minutes) = match rest.split_once(':') {
            Some((h, m)) => (h, m),
            None if rest.len() == 4 && rest.is_char_boundary(2) => rest.split_at(2),
            None => (rest, "0"),
        };

        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
            return Err(invalid());
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(DayZone::Fixed)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for DayZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayZone::Local => write!(f, "local"),
            DayZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}
