//! Core logger types

pub mod attribute;
pub mod buffer_pool;
pub mod caller;
pub mod entry;
pub mod error;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod options;

pub use buffer_pool::{BufferPool, PooledBuffer, DEFAULT_BUFFER_CAPACITY};
pub use caller::SourceLocation;
pub use entry::{Entry, FATAL_MESSAGE};
pub use error::{LoggerError, Result};
pub use log_level::Level;
pub use logger::{Logger, LoggerBuilder, SharedSink};
pub use metrics::LoggerMetrics;
pub use options::{CallerMarshalFn, Format, InternalFailure, LoggerOptions};
