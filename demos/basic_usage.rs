//! Basic logger usage example
//!
//! Demonstrates level methods, gating and the two output formats.
//!
//! Run with: cargo run --example basic_usage

use zlog::prelude::*;
use zlog::{info, warn};

#[derive(Debug, thiserror::Error)]
#[error("ConnectionRefused")]
struct ConnectionRefused;

fn main() -> Result<()> {
    println!("=== zlog - Basic Usage Example ===\n");

    // Json is the default format
    let logger = Logger::new(LoggerOptions::new().with_level(Level::Trace));

    println!("1. Logging at different levels (Json):");
    logger.trace("This is a trace message").send();
    logger.debug("This is a debug message").send();
    logger.info("This is an info message").send();
    logger.warn("This is a warning message").send();
    logger.error("This is an error message", ConnectionRefused).send();

    println!("\n2. Simple format with a minimum level of Info:");
    let logger = Logger::builder()
        .level(Level::Info)
        .format(Format::Simple)
        .build();
    logger.debug("Debug message (hidden)").send();
    logger.info("Info message (visible)").send();
    warn!(logger, "Retry {} of {}", 2, 5).send();
    println!("   Entries gated off: {}", logger.metrics().entries_gated());

    println!("\n3. Writing to standard error:");
    info!(logger, "goes to stderr").send_stderr();

    logger.flush()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
