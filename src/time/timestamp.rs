//! Timestamps with a fixed precision and a broken-down local wall clock
//!
//! A [`Timestamp`] keeps the raw integer it was measured as (seconds, millis,
//! micros or nanos since the Unix epoch) next to the calendar fields of that
//! instant in a given UTC offset. The calendar math is delegated to `chrono`.

use super::zoneinfo;
use crate::core::error::Result;
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Precision of a measured timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeMeasure {
    #[default]
    Seconds,
    Millis,
    Micros,
    Nanos,
}

impl TimeMeasure {
    /// Number of ticks per second at this precision.
    pub const fn per_second(&self) -> i128 {
        match self {
            TimeMeasure::Seconds => 1,
            TimeMeasure::Millis => 1_000,
            TimeMeasure::Micros => 1_000_000,
            TimeMeasure::Nanos => 1_000_000_000,
        }
    }
}

/// How the time field of a record is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFormatting {
    /// The raw integer in the configured measure
    #[default]
    Raw,
    /// The configured time pattern
    Pattern,
}

/// An instant measured at a given precision, with its local calendar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub measure: TimeMeasure,
    /// Ticks since the Unix epoch, in `measure` units
    pub value: i128,
    pub year: i32,
    /// 1-12
    pub month: u8,
    /// 1-366
    pub day_of_year: u16,
    /// 1-31
    pub day_of_month: u8,
    /// ISO weekday, Monday = 1 through Sunday = 7
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub milli: u16,
    pub micro: u16,
    pub nano: u16,
    pub offset_seconds: i32,
}

impl Timestamp {
    /// Current time in UTC.
    pub fn now(measure: TimeMeasure) -> Self {
        Self::from_value(measure, now_ticks(measure), 0)
    }

    /// Current time in the process-wide local zone.
    pub fn now_local(measure: TimeMeasure) -> Result<Self> {
        let value = now_ticks(measure);
        let seconds = value.div_euclid(measure.per_second()) as i64;
        let location = zoneinfo::local()?;
        let offset = location.lookup(seconds).offset;
        Ok(Self::from_value(measure, value, offset))
    }

    /// Build a timestamp from a raw tick count and the UTC offset of the wall clock.
    pub fn from_value(measure: TimeMeasure, value: i128, offset_seconds: i32) -> Self {
        let per_second = measure.per_second();
        let seconds = value.div_euclid(per_second);
        let sub = value.rem_euclid(per_second);

        let local = clamp_i64(seconds).saturating_add(i64::from(offset_seconds));
        let wall = DateTime::from_timestamp(local, 0)
            .map(|dt| dt.naive_utc())
            .unwrap_or_default();

        let (milli, micro, nano) = split_fraction(measure, sub);

        Self {
            measure,
            value,
            year: wall.year(),
            month: wall.month() as u8,
            day_of_year: wall.ordinal() as u16,
            day_of_month: wall.day() as u8,
            weekday: wall.weekday().number_from_monday() as u8,
            hour: wall.hour() as u8,
            minute: wall.minute() as u8,
            second: wall.second() as u8,
            milli,
            micro,
            nano,
            offset_seconds,
        }
    }

    /// Whole seconds since the Unix epoch.
    pub fn unix_seconds(&self) -> i128 {
        self.value.div_euclid(self.measure.per_second())
    }

    /// Whole milliseconds since the Unix epoch.
    pub fn unix_millis(&self) -> i128 {
        match self.measure {
            TimeMeasure::Seconds => self.value * 1_000,
            other => self.value.div_euclid(other.per_second() / 1_000),
        }
    }

    /// Local wall clock as a chrono value.
    pub fn wall_clock(&self) -> Option<NaiveDateTime> {
        let local = clamp_i64(self.unix_seconds()).checked_add(i64::from(self.offset_seconds))?;
        DateTime::from_timestamp(local, 0).map(|dt| dt.naive_utc())
    }
}

fn now_ticks(measure: TimeMeasure) -> i128 {
    let nanos = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_nanos() as i128,
        Err(before) => -(before.duration().as_nanos() as i128),
    };
    nanos.div_euclid(1_000_000_000 / measure.per_second())
}

fn split_fraction(measure: TimeMeasure, sub: i128) -> (u16, u16, u16) {
    match measure {
        TimeMeasure::Seconds => (0, 0, 0),
        TimeMeasure::Millis => (sub as u16, 0, 0),
        TimeMeasure::Micros => ((sub / 1_000) as u16, (sub % 1_000) as u16, 0),
        TimeMeasure::Nanos => (
            (sub / 1_000_000) as u16,
            ((sub / 1_000) % 1_000) as u16,
            (sub % 1_000) as u16,
        ),
    }
}

fn clamp_i64(value: i128) -> i64 {
    value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

pub(crate) fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2023-11-05T19:33:05.477603Z
    const MICROS: i128 = 1_699_212_785_477_603;

    #[test]
    fn test_broken_down_fields_in_offset() {
        let ts = Timestamp::from_value(TimeMeasure::Micros, MICROS, 3 * 3600);

        assert_eq!(ts.year, 2023);
        assert_eq!(ts.month, 11);
        assert_eq!(ts.day_of_month, 5);
        assert_eq!(ts.day_of_year, 309);
        assert_eq!(ts.weekday, 7);
        assert_eq!((ts.hour, ts.minute, ts.second), (22, 33, 5));
        assert_eq!((ts.milli, ts.micro, ts.nano), (477, 603, 0));
    }

    #[test]
    fn test_nanos_fraction_split() {
        let ts = Timestamp::from_value(TimeMeasure::Nanos, 1_000_000_000 + 123_456_789, 0);
        assert_eq!((ts.milli, ts.micro, ts.nano), (123, 456, 789));
        assert_eq!(ts.unix_seconds(), 1);
        assert_eq!(ts.unix_millis(), 1_123);
    }

    #[test]
    fn test_negative_values_floor() {
        let ts = Timestamp::from_value(TimeMeasure::Millis, -1, 0);
        assert_eq!(ts.year, 1969);
        assert_eq!((ts.hour, ts.minute, ts.second, ts.milli), (23, 59, 59, 999));
    }

    #[test]
    fn test_leap_years() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2100));
        assert!(!is_leap_year(2023));
    }

    #[test]
    fn test_now_has_requested_measure() {
        let ts = Timestamp::now(TimeMeasure::Millis);
        assert_eq!(ts.measure, TimeMeasure::Millis);
        assert!(ts.year >= 2024);
        assert_eq!(ts.offset_seconds, 0);
    }

    #[test]
    fn test_measure_serde() {
        let json = serde_json::to_string(&TimeMeasure::Micros).unwrap();
        assert_eq!(json, "\"micros\"");
        let formatting: TimeFormatting = serde_json::from_str("\"pattern\"").unwrap();
        assert_eq!(formatting, TimeFormatting::Pattern);
    }
}
