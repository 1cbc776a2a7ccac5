//! POSIX TZ strings, as found in the footer of TZif version 2+ files
//!
//! `std offset [dst [offset] [,start[/time],end[/time]]]`, for example
//! `EST5EDT,M3.2.0,M11.1.0` or `<+0330>-3:30`. Offsets are written west of
//! UTC, so they are negated when parsed.

use super::{ZoneLookup, OMEGA};
use crate::time::timestamp::is_leap_year;
use chrono::{DateTime, Datelike, NaiveDate};

const SECONDS_PER_MINUTE: i32 = 60;
const SECONDS_PER_HOUR: i32 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i32 = 24 * SECONDS_PER_HOUR;

const DEFAULT_RULES: &str = ",M3.2.0,M11.1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    /// `Jn`: day 1-365, February 29 never counted
    Julian,
    /// `n`: zero-based day of the year, leap days counted
    DayOfYear,
    /// `Mm.w.d`: day `d` of week `w` of month `m`, week 5 meaning the last
    MonthWeekDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rule {
    kind: RuleKind,
    day: i32,
    week: i32,
    month: i32,
    /// Local transition time, seconds after midnight
    time: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Daylight<'a> {
    name: &'a str,
    offset: i32,
    start: Rule,
    end: Rule,
}

/// A parsed POSIX TZ string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosixTz<'a> {
    std_name: &'a str,
    std_offset: i32,
    daylight: Option<Daylight<'a>>,
}

impl<'a> PosixTz<'a> {
    /// Parse a TZ string, returning `None` when it is malformed.
    pub fn parse(s: &'a str) -> Option<Self> {
        let (std_name, rest) = parse_name(s)?;
        let (std_offset, rest) = parse_offset(rest)?;
        let std_offset = -std_offset;

        if rest.is_empty() || rest.starts_with(',') {
            return Some(Self {
                std_name,
                std_offset,
                daylight: None,
            });
        }

        let (dst_name, rest) = parse_name(rest)?;
        let (dst_offset, rest) = if rest.is_empty() || rest.starts_with(',') {
            (std_offset + SECONDS_PER_HOUR, rest)
        } else {
            let (offset, rest) = parse_offset(rest)?;
            (-offset, rest)
        };

        let rest = if rest.is_empty() { DEFAULT_RULES } else { rest };
        let rest = rest.strip_prefix(',').or_else(|| rest.strip_prefix(';'))?;
        let (start, rest) = parse_rule(rest)?;
        let rest = rest.strip_prefix(',')?;
        let (end, rest) = parse_rule(rest)?;
        if !rest.is_empty() {
            return None;
        }

        Some(Self {
            std_name,
            std_offset,
            daylight: Some(Daylight {
                name: dst_name,
                offset: dst_offset,
                start,
                end,
            }),
        })
    }

    /// Zone in effect at `sec`, given the time of the last explicit transition.
    pub fn lookup(&self, last_transition: i64, sec: i64) -> Option<ZoneLookup<'a>> {
        let Some(daylight) = self.daylight else {
            return Some(ZoneLookup {
                name: self.std_name,
                offset: self.std_offset,
                start: last_transition,
                end: OMEGA,
                is_dst: false,
            });
        };

        let utc = DateTime::from_timestamp(sec, 0)?;
        let year = utc.year();
        let day = SECONDS_PER_DAY as i64;
        let year_second = i64::from(utc.ordinal0()) * day + sec.rem_euclid(day);
        let year_start = sec - year_second;

        let mut start_second = rule_time(year, daylight.start, self.std_offset)?;
        let mut end_second = rule_time(year, daylight.end, daylight.offset)?;

        let (mut in_dst, mut out_dst) = (
            ZoneLookup {
                name: daylight.name,
                offset: daylight.offset,
                start: 0,
                end: 0,
                is_dst: true,
            },
            ZoneLookup {
                name: self.std_name,
                offset: self.std_offset,
                start: 0,
                end: 0,
                is_dst: false,
            },
        );

        // Southern hemisphere: daylight time spans the new year.
        if end_second < start_second {
            std::mem::swap(&mut start_second, &mut end_second);
            std::mem::swap(&mut in_dst, &mut out_dst);
        }

        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        let year_end = year_start + days_in_year * day;
        let (zone, start, end) = if year_second < start_second {
            (out_dst, year_start, year_start + start_second)
        } else if year_second >= end_second {
            (out_dst, year_start + end_second, year_end)
        } else {
            (in_dst, year_start + start_second, year_start + end_second)
        };

        Some(ZoneLookup { start, end, ..zone })
    }
}

/// Resolve `sec` against the TZ string `extend`.
pub fn evaluate(extend: &str, last_transition: i64, sec: i64) -> Option<ZoneLookup<'_>> {
    PosixTz::parse(extend)?.lookup(last_transition, sec)
}

fn parse_name(s: &str) -> Option<(&str, &str)> {
    if let Some(quoted) = s.strip_prefix('<') {
        let close = quoted.find('>')?;
        return Some((&quoted[..close], &quoted[close + 1..]));
    }

    let end = s
        .find(|c: char| c.is_ascii_digit() || matches!(c, ',' | '-' | '+'))
        .unwrap_or(s.len());
    (end >= 3).then(|| (&s[..end], &s[end..]))
}

/// `[+|-]hh[:mm[:ss]]`, in seconds with the written sign.
fn parse_offset(s: &str) -> Option<(i32, &str)> {
    let (negative, s) = match s.as_bytes().first().copied()? {
        b'+' => (false, &s[1..]),
        b'-' => (true, &s[1..]),
        _ => (false, s),
    };

    let (hours, mut rest) = parse_number(s, 0, 24 * 7)?;
    let mut offset = hours * SECONDS_PER_HOUR;

    if let Some(after) = rest.strip_prefix(':') {
        let (minutes, after) = parse_number(after, 0, 59)?;
        offset += minutes * SECONDS_PER_MINUTE;
        rest = after;

        if let Some(after) = rest.strip_prefix(':') {
            let (seconds, after) = parse_number(after, 0, 59)?;
            offset += seconds;
            rest = after;
        }
    }

    Some((if negative { -offset } else { offset }, rest))
}

fn parse_rule(s: &str) -> Option<(Rule, &str)> {
    let (mut rule, rest) = if let Some(after) = s.strip_prefix('J') {
        let (day, rest) = parse_number(after, 1, 365)?;
        (
            Rule {
                kind: RuleKind::Julian,
                day,
                week: 0,
                month: 0,
                time: 0,
            },
            rest,
        )
    } else if let Some(after) = s.strip_prefix('M') {
        let (month, rest) = parse_number(after, 1, 12)?;
        let (week, rest) = parse_number(rest.strip_prefix('.')?, 1, 5)?;
        let (day, rest) = parse_number(rest.strip_prefix('.')?, 0, 6)?;
        (
            Rule {
                kind: RuleKind::MonthWeekDay,
                day,
                week,
                month,
                time: 0,
            },
            rest,
        )
    } else {
        let (day, rest) = parse_number(s, 0, 365)?;
        (
            Rule {
                kind: RuleKind::DayOfYear,
                day,
                week: 0,
                month: 0,
                time: 0,
            },
            rest,
        )
    };

    match rest.strip_prefix('/') {
        Some(after) => {
            let (time, rest) = parse_offset(after)?;
            rule.time = time;
            Some((rule, rest))
        }
        None => {
            rule.time = 2 * SECONDS_PER_HOUR;
            Some((rule, rest))
        }
    }
}

fn parse_number(s: &str, min: i32, max: i32) -> Option<(i32, &str)> {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let mut number: i32 = 0;
    for byte in s[..digits].bytes() {
        number = number * 10 + i32::from(byte - b'0');
        if number > max {
            return None;
        }
    }

    (number >= min).then(|| (number, &s[digits..]))
}

/// Seconds after the start of `year` (UTC) at which `rule` fires, for a zone
/// whose offset before the transition is `offset`.
fn rule_time(year: i32, rule: Rule, offset: i32) -> Option<i64> {
    let day = i64::from(SECONDS_PER_DAY);
    let seconds = match rule.kind {
        RuleKind::Julian => {
            let mut seconds = i64::from(rule.day - 1) * day;
            if is_leap_year(year) && rule.day >= 60 {
                seconds += day;
            }
            seconds
        }
        RuleKind::DayOfYear => i64::from(rule.day) * day,
        RuleKind::MonthWeekDay => {
            let month = rule.month as u32;
            let first = NaiveDate::from_ymd_opt(year, month, 1)?;
            let first_weekday = first.weekday().num_days_from_sunday() as i32;

            let mut day_of_month = rule.day - first_weekday;
            if day_of_month < 0 {
                day_of_month += 7;
            }
            let month_length = days_in_month(year, month);
            for _ in 1..rule.week {
                if day_of_month + 7 >= month_length {
                    break;
                }
                day_of_month += 7;
            }

            i64::from(day_of_month + first.ordinal0() as i32) * day
        }
    };

    Some(seconds + i64::from(rule.time) - i64::from(offset))
}

fn days_in_month(year: i32, month: u32) -> i32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_rules_without_daylight_name() {
        let tz = PosixTz::parse("UTC0,M3.2.0,M11.1.0").unwrap();
        assert_eq!(tz.lookup(0, 0).unwrap().offset, 0);
    }

    #[test]
    fn test_parse_standard_only() {
        let tz = PosixTz::parse("JST-9").unwrap();
        let found = tz.lookup(100, 1_700_000_000).unwrap();
        assert_eq!((found.name, found.offset, found.is_dst), ("JST", 9 * 3600, false));
        assert_eq!((found.start, found.end), (100, OMEGA));
    }

    #[test]
    fn test_parse_quoted_names_and_minutes() {
        let tz = PosixTz::parse("<+0330>-3:30").unwrap();
        let found = tz.lookup(0, 0).unwrap();
        assert_eq!(found.name, "+0330");
        assert_eq!(found.offset, 3 * 3600 + 30 * 60);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(PosixTz::parse("").is_none());
        assert!(PosixTz::parse("AB5").is_none());
        assert!(PosixTz::parse("EST").is_none());
        assert!(PosixTz::parse("EST5EDT,M13.1.0,M11.1.0").is_none());
        assert!(PosixTz::parse("EST5EDT,M3.2.0").is_none());
        assert!(PosixTz::parse("<EST5").is_none());
        assert!(PosixTz::parse("EST5EDT,M3.2.0;M11.1.0").is_none());
    }

    #[test]
    fn test_new_york_rules() {
        let rules = "EST5EDT,M3.2.0,M11.1.0";

        // 2023-03-12T06:59:59Z, one second before the spring change
        let before = evaluate(rules, 0, 1_678_604_399).unwrap();
        assert_eq!((before.name, before.offset), ("EST", -18000));
        assert_eq!(before.end, 1_678_604_400);

        let after = evaluate(rules, 0, 1_678_604_400).unwrap();
        assert_eq!((after.name, after.offset, after.is_dst), ("EDT", -14400, true));
        // 2023-11-05T06:00:00Z
        assert_eq!(after.end, 1_699_164_000);

        let autumn = evaluate(rules, 0, 1_699_164_000).unwrap();
        assert_eq!((autumn.name, autumn.offset, autumn.is_dst), ("EST", -18000, false));
        // 2024-01-01T00:00:00Z
        assert_eq!(autumn.end, 1_704_067_200);
    }

    #[test]
    fn test_window_reaches_end_of_leap_year() {
        // 2024-12-31T12:00:00Z
        let sec = 1_735_646_400;
        let found = evaluate("EST5EDT,M3.2.0,M11.1.0", 0, sec).unwrap();
        assert_eq!((found.name, found.is_dst), ("EST", false));
        // 2024-11-03T06:00:00Z
        assert_eq!(found.start, 1_730_613_600);
        // 2025-01-01T00:00:00Z
        assert_eq!(found.end, 1_735_689_600);
        assert!(found.start <= sec && sec < found.end);
    }

    #[test]
    fn test_default_rules_when_omitted() {
        let explicit = evaluate("EST5EDT,M3.2.0,M11.1.0", 0, 1_688_169_600).unwrap();
        let implicit = evaluate("EST5EDT", 0, 1_688_169_600).unwrap();
        assert_eq!(explicit, implicit);
    }

    #[test]
    fn test_southern_hemisphere_swaps() {
        let rules = "AEST-10AEDT,M10.1.0,M4.1.0/3";

        // 2023-01-15T00:00:00Z, summer in Sydney
        let summer = evaluate(rules, 0, 1_673_740_800).unwrap();
        assert_eq!((summer.name, summer.offset, summer.is_dst), ("AEDT", 11 * 3600, true));

        // 2023-07-01T00:00:00Z, winter in Sydney
        let winter = evaluate(rules, 0, 1_688_169_600).unwrap();
        assert_eq!((winter.name, winter.offset, winter.is_dst), ("AEST", 10 * 3600, false));
        assert!(winter.start < 1_688_169_600 && 1_688_169_600 < winter.end);
    }

    #[test]
    fn test_julian_and_day_of_year_rules() {
        // J60 is always March 1; day 59 is March 1 only in common years.
        let julian = PosixTz::parse("AAA0BBB,J60/0,J300/0").unwrap();
        // 2024-03-01T00:00:00Z
        let found = julian.lookup(0, 1_709_251_200).unwrap();
        assert_eq!(found.start, 1_709_251_200);
        assert!(found.is_dst);

        let zero_based = PosixTz::parse("AAA0BBB,59/0,300/0").unwrap();
        // 2023-03-01T00:00:00Z
        let found = zero_based.lookup(0, 1_677_628_800).unwrap();
        assert_eq!(found.start, 1_677_628_800);
        assert!(found.is_dst);
    }

    #[test]
    fn test_last_week_of_month() {
        // Last Sunday of March 2023 is the 26th; 01:00 UTC with a zero offset
        let found = evaluate("GMT0BST,M3.5.0/1,M10.5.0", 0, 1_679_792_400).unwrap();
        assert_eq!(found.start, 1_679_792_400);
        assert_eq!((found.name, found.offset), ("BST", 3600));
    }
}
