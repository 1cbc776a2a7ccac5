//! Structured fields example
//!
//! Demonstrates static fields, typed attributes, caller output, struct
//! escaping and a pooled logger writing to a shared sink.
//!
//! Run with: cargo run --example structured_fields

use serde::Serialize;
use zlog::prelude::*;

#[derive(Serialize)]
struct Peer {
    host: &'static str,
    port: u16,
}

#[derive(Serialize)]
enum Role {
    Primary,
}

fn main() -> Result<()> {
    println!("=== zlog - Structured Fields Example ===\n");

    println!("1. Static fields and typed attributes:");
    let mut logger = Logger::with_pool(BufferPool::new().shared(), LoggerOptions::new());
    logger.with("svc", "billing").with("region", "eu-west-1");

    logger
        .info("connected")
        .attr("peer", &Peer { host: "db-1", port: 5432 })
        .attr("role", &Role::Primary)
        .attr("latency_ms", &3.25)
        .attr("replica", &None::<&str>)
        .send();

    let parsed: std::result::Result<u32, std::num::ParseIntError> = "x".parse();
    logger.warn("bad limit").attr_result("limit", &parsed).send();

    println!("\n2. Caller output:");
    let logger = Logger::new(LoggerOptions::new().with_format(Format::Simple).with_caller_enabled(true));
    logger.info("called from here").caller().send();
    zlog::info!(logger, "or through a macro").send();

    println!("\n3. Struct escaping in the simple format:");
    let logger = Logger::new(LoggerOptions::new().with_format(Format::Simple).with_struct_escape("\"", "'"));
    logger.info("escaped").attr("peer", &Peer { host: "db-2", port: 6432 }).send();

    println!("\n4. Options loaded from JSON:");
    let options = LoggerOptions::from_json(r#"{"level":"debug","format":"simple","error_field_name":"err"}"#)?;
    let logger = Logger::new(options);
    logger.error("lookup failed", "NotFound").attr("key", "user:42").send();

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
