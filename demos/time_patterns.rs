//! Time pattern example
//!
//! Demonstrates raw and pattern time fields, the pattern tokens and zone
//! lookups against the zoneinfo database.
//!
//! Run with: cargo run --example time_patterns

use zlog::prelude::*;
use zlog::time::{pattern, zoneinfo};

fn main() -> Result<()> {
    println!("=== zlog - Time Patterns Example ===\n");

    println!("1. Raw time fields:");
    let logger = Logger::new(
        LoggerOptions::new()
            .with_time_enabled(true)
            .with_time_measure(TimeMeasure::Millis),
    );
    logger.info("millis since the epoch").send();

    println!("\n2. Pattern time fields in the local zone:");
    let logger = Logger::new(
        LoggerOptions::new()
            .with_format(Format::Simple)
            .with_time_enabled(true)
            .with_time_measure(TimeMeasure::Micros)
            .with_time_pattern("YYYY-MM-DD HH:mm:ss.SSS ZZ"),
    );
    logger.info("local wall clock").send();

    println!("\n3. Pattern tokens:");
    let ts = Timestamp::from_value(TimeMeasure::Micros, 1_699_212_785_477_603, 3 * 3600);
    for text in ["YYYY MMM Do ddd HH:mm:ss.SSS UTCZZZ - Qo", "dddd, MMMM D YYYY h:mm A", "DDDo day, week wo", "X x"] {
        println!("   {:<42} => {}", text, pattern::format(&ts, text));
    }

    println!("\n4. Zone lookups:");
    let instant = 1_688_169_600; // 2023-07-01T00:00:00Z
    for name in ["UTC", "America/New_York", "Europe/London", "Australia/Sydney", "Asia/Tokyo"] {
        let location = zoneinfo::load(name)?;
        let found = location.lookup(instant);
        println!(
            "   {:<18} {:<5} {:+6} dst={}",
            name, found.name, found.offset, found.is_dst
        );
    }

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
