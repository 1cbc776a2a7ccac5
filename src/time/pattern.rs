//! Token based time patterns
//!
//! Patterns are tokenized greedily: at each position the longest token (at
//! most four characters) from the fixed token table wins. Anything that is
//! not a token is copied through verbatim; there is no escape syntax.
//!
//! ```
//! use zlog::time::{pattern, TimeMeasure, Timestamp};
//!
//! // 2023-11-05T19:33:05.477603Z seen from UTC+03:00
//! let ts = Timestamp::from_value(TimeMeasure::Micros, 1_699_212_785_477_603, 3 * 3600);
//! let out = pattern::format(&ts, "YYYY MMM Do ddd HH:mm:ss.SSS UTCZZZ - Qo");
//! assert_eq!(out, "2023 Nov 5th Sun 22:33:05.477 UTC+03:00 - 4th");
//! ```

use super::timestamp::{is_leap_year, TimeMeasure, Timestamp};
use std::fmt::{self, Write};

const MONTH_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const MONTH_LONG: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
// Indexed Sunday first
const WEEKDAY_MIN: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
const WEEKDAY_SHORT: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const WEEKDAY_LONG: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];
// Days in a common year up to and including the indexed month
const DAYS_THROUGH_MONTH: [u16; 13] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Month,
    Month2,
    MonthOrdinal,
    MonthShort,
    MonthLong,
    Quarter,
    Quarter2,
    QuarterOrdinal,
    DayOfMonth,
    DayOfMonth2,
    DayOfMonthOrdinal,
    DayOfYear,
    DayOfYear3,
    DayOfYearOrdinal,
    Weekday,
    WeekdayMin,
    WeekdayShort,
    WeekdayLong,
    IsoWeekday,
    IsoWeekdayNext,
    LocaleWeekday,
    Week,
    WeekOrdinal,
    Week2,
    YearHolocene,
    Year2,
    Year,
    Year4,
    EraLong,
    EraShort,
    MeridiemUpper,
    MeridiemLower,
    Hour,
    Hour2,
    Hour12,
    Hour12Pad,
    Hour24,
    Hour24Pad,
    Minute,
    Minute2,
    Second,
    Second2,
    Fraction1,
    Fraction2,
    Fraction3,
    OffsetHours,
    OffsetCompact,
    OffsetColon,
    UnixMillis,
    UnixSeconds,
}

const TOKENS: &[(&str, Token)] = &[
    ("MMMM", Token::MonthLong),
    ("DDDD", Token::DayOfYear3),
    ("DDDo", Token::DayOfYearOrdinal),
    ("dddd", Token::WeekdayLong),
    ("YYYY", Token::Year4),
    ("MMM", Token::MonthShort),
    ("DDD", Token::DayOfYear),
    ("ddd", Token::WeekdayShort),
    ("YYY", Token::Year),
    ("SSS", Token::Fraction3),
    ("ZZZ", Token::OffsetColon),
    ("MM", Token::Month2),
    ("Mo", Token::MonthOrdinal),
    ("QQ", Token::Quarter2),
    ("Qo", Token::QuarterOrdinal),
    ("DD", Token::DayOfMonth2),
    ("Do", Token::DayOfMonthOrdinal),
    ("dd", Token::WeekdayMin),
    ("wo", Token::WeekOrdinal),
    ("ww", Token::Week2),
    ("YY", Token::Year2),
    ("NN", Token::EraShort),
    ("HH", Token::Hour2),
    ("hh", Token::Hour12Pad),
    ("kk", Token::Hour24Pad),
    ("mm", Token::Minute2),
    ("ss", Token::Second2),
    ("SS", Token::Fraction2),
    ("ZZ", Token::OffsetCompact),
    ("M", Token::Month),
    ("Q", Token::Quarter),
    ("D", Token::DayOfMonth),
    ("d", Token::Weekday),
    ("c", Token::IsoWeekday),
    ("E", Token::IsoWeekdayNext),
    ("e", Token::LocaleWeekday),
    ("w", Token::Week),
    ("Y", Token::YearHolocene),
    ("N", Token::EraLong),
    ("A", Token::MeridiemUpper),
    ("a", Token::MeridiemLower),
    ("H", Token::Hour),
    ("h", Token::Hour12),
    ("k", Token::Hour24),
    ("m", Token::Minute),
    ("s", Token::Second),
    ("S", Token::Fraction1),
    ("Z", Token::OffsetHours),
    ("x", Token::UnixMillis),
    ("X", Token::UnixSeconds),
];

const MAX_TOKEN_LEN: usize = 4;

fn match_token(rest: &str) -> Option<(Token, usize)> {
    for len in (1..=MAX_TOKEN_LEN.min(rest.len())).rev() {
        let Some(candidate) = rest.get(..len) else {
            continue;
        };
        if let Some((_, token)) = TOKENS.iter().find(|(text, _)| *text == candidate) {
            return Some((*token, len));
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Token(Token),
}

/// A pattern tokenized once and rendered many times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePattern {
    source: String,
    pieces: Vec<Piece>,
}

impl TimePattern {
    pub fn compile(pattern: &str) -> Self {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut rest = pattern;

        while let Some(ch) = rest.chars().next() {
            if let Some((token, len)) = match_token(rest) {
                if !literal.is_empty() {
                    pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                }
                pieces.push(Piece::Token(token));
                rest = &rest[len..];
            } else {
                literal.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Self {
            source: pattern.to_string(),
            pieces,
        }
    }

    /// The pattern text this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn render<W: Write>(&self, out: &mut W, ts: &Timestamp) -> fmt::Result {
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.write_str(text)?,
                Piece::Token(token) => render_token(out, *token, ts)?,
            }
        }
        Ok(())
    }

    pub fn format(&self, ts: &Timestamp) -> String {
        let mut out = String::with_capacity(self.source.len() + 16);
        // Writing into a String cannot fail
        let _ = self.render(&mut out, ts);
        out
    }
}

/// Render `ts` against `pattern`.
pub fn format(ts: &Timestamp, pattern: &str) -> String {
    TimePattern::compile(pattern).format(ts)
}

/// Render `ts` against `pattern` into an existing writer.
pub fn format_into<W: Write>(out: &mut W, ts: &Timestamp, pattern: &str) -> fmt::Result {
    TimePattern::compile(pattern).render(out, ts)
}

fn ordinal_suffix(n: u32) -> &'static str {
    match n % 100 {
        11..=13 => "th",
        _ => match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

fn week_of_year(ts: &Timestamp) -> u32 {
    let leap_adjust = u32::from(is_leap_year(ts.year) && ts.month > 2);
    (u32::from(ts.day_of_year) + 6 - leap_adjust) / 7
}

fn render_token<W: Write>(out: &mut W, token: Token, ts: &Timestamp) -> fmt::Result {
    let month = u32::from(ts.month);
    let month_index = (ts.month.clamp(1, 12) - 1) as usize;
    let quarter = (month.saturating_sub(1)) / 3 + 1;
    let day = u32::from(ts.day_of_month);
    let day_of_year = u32::from(ts.day_of_year);
    let sunday_first = (ts.weekday % 7) as usize;
    let hour12 = match ts.hour % 12 {
        0 => 12,
        h => h,
    };

    match token {
        Token::Month => write!(out, "{}", month),
        Token::Month2 => write!(out, "{:02}", month),
        Token::MonthOrdinal => write!(out, "{}{}", month, ordinal_suffix(month)),
        Token::MonthShort => out.write_str(MONTH_SHORT[month_index]),
        Token::MonthLong => out.write_str(MONTH_LONG[month_index]),
        Token::Quarter => write!(out, "{}", quarter),
        Token::Quarter2 => write!(out, "{:02}", quarter),
        Token::QuarterOrdinal => write!(out, "{}{}", quarter, ordinal_suffix(quarter)),
        Token::DayOfMonth => write!(out, "{}", day),
        Token::DayOfMonth2 => write!(out, "{:02}", day),
        Token::DayOfMonthOrdinal => write!(out, "{}{}", day, ordinal_suffix(day % 30)),
        Token::DayOfYear => write!(out, "{}", day_of_year),
        Token::DayOfYear3 => write!(out, "{:03}", day_of_year),
        Token::DayOfYearOrdinal => {
            let through = u32::from(DAYS_THROUGH_MONTH[month_index + 1]);
            write!(out, "{}{}", day_of_year, ordinal_suffix(day_of_year % through))
        }
        Token::Weekday => write!(out, "{}", sunday_first),
        Token::WeekdayMin => out.write_str(WEEKDAY_MIN[sunday_first]),
        Token::WeekdayShort => out.write_str(WEEKDAY_SHORT[sunday_first]),
        Token::WeekdayLong => out.write_str(WEEKDAY_LONG[sunday_first]),
        Token::IsoWeekday | Token::LocaleWeekday => write!(out, "{}", ts.weekday),
        Token::IsoWeekdayNext => write!(out, "{}", ts.weekday + 1),
        Token::Week => write!(out, "{}", week_of_year(ts)),
        Token::WeekOrdinal => {
            let week = week_of_year(ts);
            write!(out, "{}{}", week, ordinal_suffix(week))
        }
        Token::Week2 => write!(out, "{:02}", week_of_year(ts)),
        Token::YearHolocene => write!(out, "{}", ts.year + 10_000),
        Token::Year2 => write!(out, "{:02}", ts.year.rem_euclid(100)),
        Token::Year => write!(out, "{}", ts.year),
        Token::Year4 => write!(out, "{:04}", ts.year),
        Token::EraLong => out.write_str("Before Christ"),
        Token::EraShort => out.write_str("BC"),
        Token::MeridiemUpper => out.write_str(if ts.hour < 12 { "AM" } else { "PM" }),
        Token::MeridiemLower => out.write_str(if ts.hour < 12 { "am" } else { "pm" }),
        Token::Hour | Token::Hour24 => write!(out, "{}", ts.hour),
        Token::Hour2 | Token::Hour24Pad => write!(out, "{:02}", ts.hour),
        Token::Hour12 => write!(out, "{}", hour12),
        Token::Hour12Pad => write!(out, "{:02}", hour12),
        Token::Minute => write!(out, "{}", ts.minute),
        Token::Minute2 => write!(out, "{:02}", ts.minute),
        Token::Second => write!(out, "{}", ts.second),
        Token::Second2 => write!(out, "{:02}", ts.second),
        Token::Fraction1 => {
            if ts.measure > TimeMeasure::Millis {
                write!(out, "{}", ts.value.rem_euclid(1_000) / 100)?;
            }
            Ok(())
        }
        Token::Fraction2 => {
            if ts.measure > TimeMeasure::Millis {
                write!(out, "{:02}", ts.value.rem_euclid(1_000) / 10)?;
            }
            Ok(())
        }
        Token::Fraction3 => {
            if ts.measure >= TimeMeasure::Millis {
                write!(out, "{:03}", ts.milli)?;
            }
            Ok(())
        }
        Token::OffsetHours => {
            let (sign, hours, _) = split_offset(ts.offset_seconds);
            write!(out, "{}{}", sign, hours)
        }
        Token::OffsetCompact => {
            let (sign, hours, minutes) = split_offset(ts.offset_seconds);
            write!(out, "{}{:02}{:02}", sign, hours, minutes)
        }
        Token::OffsetColon => {
            let (sign, hours, minutes) = split_offset(ts.offset_seconds);
            write!(out, "{}{:02}:{:02}", sign, hours, minutes)
        }
        Token::UnixMillis => write!(out, "{}", ts.unix_millis()),
        Token::UnixSeconds => write!(out, "{}", ts.unix_seconds()),
    }
}

fn split_offset(offset_seconds: i32) -> (char, u32, u32) {
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let abs = offset_seconds.unsigned_abs();
    (sign, abs / 3600, (abs % 3600) / 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(measure: TimeMeasure, value: i128) -> Timestamp {
        Timestamp::from_value(measure, value, 0)
    }

    // 2023-11-05T19:33:05.477603Z
    const MICROS: i128 = 1_699_212_785_477_603;

    #[test]
    fn test_reference_pattern() {
        let ts = Timestamp::from_value(TimeMeasure::Micros, MICROS, 3 * 3600);
        assert_eq!(
            format(&ts, "YYYY MMM Do ddd HH:mm:ss.SSS UTCZZZ - Qo"),
            "2023 Nov 5th Sun 22:33:05.477 UTC+03:00 - 4th"
        );
    }

    #[test]
    fn test_default_logger_pattern() {
        let ts = Timestamp::from_value(TimeMeasure::Micros, MICROS, 3 * 3600);
        assert_eq!(format(&ts, "DD/MM/YYYY'T'HH:mm:ss"), "05/11/2023'T'22:33:05");
    }

    #[test]
    fn test_greedy_longest_match() {
        let ts = Timestamp::from_value(TimeMeasure::Micros, MICROS, 0);
        assert_eq!(format(&ts, "MMMM"), "November");
        assert_eq!(format(&ts, "MMMMM"), "November11");
        assert_eq!(format(&ts, "DDDDo"), "309o");
    }

    #[test]
    fn test_passthrough_is_verbatim() {
        let ts = utc(TimeMeasure::Seconds, 0);
        assert_eq!(format(&ts, "-/:. ,!|"), "-/:. ,!|");
        assert_eq!(format(&ts, "→ ü"), "→ ü");
        assert_eq!(format(&ts, ""), "");
    }

    #[test]
    fn test_fraction_tokens_follow_measure() {
        let seconds = utc(TimeMeasure::Seconds, 10);
        assert_eq!(format(&seconds, "ss.SSS|"), "10.|");
        assert_eq!(format(&seconds, "S SS"), " ");

        let millis = utc(TimeMeasure::Millis, 10_042);
        assert_eq!(format(&millis, "ss.SSS"), "10.042");
        assert_eq!(format(&millis, "[S][SS]"), "[][]");

        let nanos = utc(TimeMeasure::Nanos, 5_000_000_000);
        assert_eq!(format(&nanos, "SSS"), "000");

        let micros = utc(TimeMeasure::Micros, 1_000_789);
        assert_eq!(format(&micros, "S SS SSS"), "7 78 000");
    }

    #[test]
    fn test_leap_year_month_day() {
        // 2000-02-29T12:00:00Z
        let leap = utc(TimeMeasure::Seconds, 951_825_600);
        assert_eq!(format(&leap, "MM-DD"), "02-29");

        // 2100-03-01T00:00:00Z, 2100 is not a leap year
        let not_leap = utc(TimeMeasure::Seconds, 4_107_542_400);
        assert_eq!(format(&not_leap, "MM-DD DDD"), "03-01 60");
    }

    #[test]
    fn test_day_of_year_ordinals() {
        // 2023-01-01, 2023-01-22, 2023-04-21
        let day1 = utc(TimeMeasure::Seconds, 1_672_531_200);
        let day22 = utc(TimeMeasure::Seconds, 1_672_531_200 + 21 * 86_400);
        let day111 = utc(TimeMeasure::Seconds, 1_672_531_200 + 110 * 86_400);

        assert_eq!(format(&day1, "DDDo"), "1st");
        assert_eq!(format(&day22, "DDDo"), "22nd");
        assert_eq!(format(&day111, "DDDo"), "111th");
        assert_eq!(format(&day1, "DDDD"), "001");
    }

    #[test]
    fn test_weekday_tokens() {
        // 2023-11-05 is a Sunday
        let ts = Timestamp::from_value(TimeMeasure::Micros, MICROS, 0);
        assert_eq!(format(&ts, "d dd ddd dddd"), "0 Su Sun Sunday");
        assert_eq!(format(&ts, "c E e"), "7 8 7");
    }

    #[test]
    fn test_hours_and_meridiem() {
        // 1970-01-01T00:30:00Z and 13:05:00Z
        let midnight = utc(TimeMeasure::Seconds, 1_800);
        assert_eq!(format(&midnight, "H HH h hh k kk A a"), "0 00 12 12 0 00 AM am");

        let afternoon = utc(TimeMeasure::Seconds, 13 * 3600 + 300);
        assert_eq!(format(&afternoon, "H h hh m mm A a"), "13 1 01 5 05 PM pm");
    }

    #[test]
    fn test_offset_tokens() {
        let east = Timestamp::from_value(TimeMeasure::Seconds, 0, 5 * 3600 + 30 * 60);
        assert_eq!(format(&east, "Z ZZ ZZZ"), "+5 +0530 +05:30");

        let west = Timestamp::from_value(TimeMeasure::Seconds, 0, -8 * 3600);
        assert_eq!(format(&west, "Z ZZ ZZZ"), "-8 -0800 -08:00");
    }

    #[test]
    fn test_year_and_unix_tokens() {
        let ts = Timestamp::from_value(TimeMeasure::Millis, 1_699_212_785_477, 0);
        assert_eq!(format(&ts, "Y YY YYY YYYY"), "12023 23 2023 2023");
        assert_eq!(format(&ts, "X x"), "1699212785 1699212785477");
        assert_eq!(format(&ts, "N NN"), "Before Christ BC");
    }

    #[test]
    fn test_month_and_quarter_tokens() {
        let ts = Timestamp::from_value(TimeMeasure::Micros, MICROS, 0);
        assert_eq!(format(&ts, "M MM Mo MMM"), "11 11 11th Nov");
        assert_eq!(format(&ts, "Q QQ Qo"), "4 04 4th");
    }

    #[test]
    fn test_compiled_pattern_reuse() {
        let pattern = TimePattern::compile("HH:mm");
        assert_eq!(pattern.as_str(), "HH:mm");
        assert_eq!(pattern.format(&utc(TimeMeasure::Seconds, 3_660)), "01:01");
        assert_eq!(pattern.format(&utc(TimeMeasure::Seconds, 7_380)), "02:03");
    }
}
