//! # zlog
//!
//! A structured, leveled logger that renders each record into a pooled
//! buffer and hands it to a sink in one write.
//!
//! ## Features
//!
//! - **Two formats**: single-line JSON objects or `LEVL msg key=value` lines
//! - **Typed attributes**: anything implementing `serde::Serialize`
//! - **Buffer pooling**: records reuse buffers through a shared [`BufferPool`]
//! - **Time patterns**: moment-style tokens such as `YYYY-MM-DD HH:mm:ss.SSS`
//! - **Zoneinfo**: a native TZif reader with POSIX rule support and an
//!   embedded fallback database
//!
//! ## Example
//!
//! ```
//! use zlog::prelude::*;
//!
//! let mut logger = Logger::new(LoggerOptions::new());
//! logger.with("svc", "web");
//!
//! let mut out = Vec::new();
//! logger.info("up").attr("port", &8080).send_to(&mut out).unwrap();
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     "{\"level\": \"info\", \"message\": \"up\", \"svc\": \"web\", \"port\":8080}\n"
//! );
//! ```

pub mod core;
pub mod macros;
pub mod time;

pub mod prelude {
    pub use crate::core::{
        BufferPool, Entry, Format, InternalFailure, Level, Logger, LoggerBuilder, LoggerError,
        LoggerMetrics, LoggerOptions, Result, SourceLocation,
    };
    pub use crate::time::{TimeFormatting, TimeMeasure, Timestamp};
}

pub use core::{
    BufferPool, CallerMarshalFn, Entry, Format, InternalFailure, Level, Logger, LoggerBuilder,
    LoggerError, LoggerMetrics, LoggerOptions, PooledBuffer, Result, SharedSink, SourceLocation,
    FATAL_MESSAGE,
};
pub use time::{Location, TimeFormatting, TimeMeasure, TimePattern, Timestamp, ZoneInfoError};
