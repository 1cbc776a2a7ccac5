//! Logging macros for ergonomic log message formatting.
//!
//! Each macro formats its message like `format!`, attaches the call site
//! (when the logger has caller output enabled) and returns the [`Entry`] so
//! attributes can still be chained before sending. The message is only
//! formatted when the level is enabled.
//!
//! [`Entry`]: crate::Entry
//!
//! # Examples
//!
//! ```
//! use zlog::prelude::*;
//! use zlog::info;
//!
//! let logger = Logger::new(LoggerOptions::new().with_format(Format::Simple));
//!
//! let port = 8080;
//! let mut out = Vec::new();
//! info!(logger, "listening on {}", port).attr("tls", &false).send_to(&mut out).unwrap();
//! assert_eq!(out, b"INFO listening on 8080 tls=\"false\"\n");
//! ```

/// The [`SourceLocation`](crate::SourceLocation) of the macro invocation.
#[macro_export]
macro_rules! location {
    () => {
        $crate::SourceLocation::new(file!(), line!())
    };
}

/// Start a record at `level` with a formatted message.
///
/// # Examples
///
/// ```
/// # use zlog::prelude::*;
/// # let logger = Logger::new(LoggerOptions::new());
/// use zlog::log;
/// log!(logger, Level::Info, "Simple message").send();
/// log!(logger, Level::Error, "Error code: {}", 500).send();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level: $crate::Level = $level;
        if logger.enabled(level) {
            logger.log(level, &format!($($arg)+)).source($crate::location!())
        } else {
            logger.log(level, "")
        }
    }};
}

/// Start a trace-level record.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Trace, $($arg)+)
    };
}

/// Start a debug-level record.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Start an info-level record.
///
/// # Examples
///
/// ```
/// # use zlog::prelude::*;
/// # let logger = Logger::new(LoggerOptions::new());
/// use zlog::info;
/// info!(logger, "Processing {} items", 100).attr("batch", &7).send();
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Start a warning-level record.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

/// Start an error-level record.
///
/// Chain [`Entry::err`](crate::Entry::err) to attach the error itself.
///
/// ```
/// # use zlog::prelude::*;
/// # let logger = Logger::new(LoggerOptions::new());
/// use zlog::error;
/// error!(logger, "request {} failed", 17).err("Timeout").send();
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

/// Start a fatal-level record. Sending it aborts the process after the write.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Fatal, $($arg)+)
    };
}
