//! Time measurement, pattern formatting and time zone resolution

pub mod pattern;
pub mod timestamp;
pub mod zoneinfo;

pub use pattern::TimePattern;
pub use timestamp::{TimeFormatting, TimeMeasure, Timestamp};
pub use zoneinfo::{Location, ZoneInfoError, ZoneLookup};
