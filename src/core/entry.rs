//! Per-record builder
//!
//! An [`Entry`] is returned by the level methods of [`Logger`]. Its buffer
//! already holds the record prefix (time, level, message, error and static
//! fields); chained calls append attributes, and one of the `send` methods
//! frames the record and writes it in a single call.
//!
//! An entry below the logger's level carries no buffer at all: every chained
//! call is a no-op and nothing is borrowed from the pool.

use super::attribute;
use super::buffer_pool::PooledBuffer;
use super::caller::SourceLocation;
use super::error::LoggerError;
use super::log_level::Level;
use super::logger::Logger;
use super::options::Format;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::process;

/// Printed to standard error before a fatal record aborts the process.
pub const FATAL_MESSAGE: &str = "fatal log record emitted";

/// A record under construction.
#[must_use = "an entry does nothing until it is sent"]
pub struct Entry<'a> {
    level: Level,
    state: Option<EntryState<'a>>,
}

struct EntryState<'a> {
    logger: &'a Logger,
    buf: PooledBuffer,
}

impl<'a> Entry<'a> {
    pub(crate) fn enabled(level: Level, logger: &'a Logger, buf: PooledBuffer) -> Self {
        Self {
            level,
            state: Some(EntryState { logger, buf }),
        }
    }

    pub(crate) fn disabled(level: Level) -> Self {
        Self { level, state: None }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Whether this entry will produce output when sent.
    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }

    /// The record rendered so far, without its terminator.
    pub fn as_bytes(&self) -> &[u8] {
        self.state.as_ref().map(|state| &state.buf[..]).unwrap_or(&[])
    }

    /// Attach `name` / `value`.
    pub fn attr<V>(mut self, name: &str, value: &V) -> Self
    where
        V: Serialize + ?Sized,
    {
        if let Some(state) = &mut self.state {
            let options = state.logger.options();
            if let Err(err) = attribute::write_attr(&mut state.buf, name, value, options) {
                state.logger.report(err);
            }
        }
        self
    }

    /// Attach the success value under `name`, or the error under the error field.
    pub fn attr_result<T, E>(self, name: &str, value: &Result<T, E>) -> Self
    where
        T: Serialize,
        E: fmt::Display,
    {
        match value {
            Ok(inner) => self.attr(name, inner),
            Err(err) => self.err(err),
        }
    }

    /// Attach an error's display text under the error field.
    pub fn err(mut self, err: impl fmt::Display) -> Self {
        if let Some(state) = &mut self.state {
            let options = state.logger.options();
            let name = err.to_string();
            if let Err(err) = attribute::write_tag(&mut state.buf, &options.error_field_name, &name, options) {
                state.logger.report(err);
            }
        }
        self
    }

    /// Attach the call site when the logger has caller output enabled.
    pub fn source(mut self, location: SourceLocation) -> Self {
        if let Some(state) = &mut self.state {
            let options = state.logger.options();
            if options.caller_enabled {
                let caller = options.marshal_caller(&location);
                if let Err(err) = attribute::write_str(&mut state.buf, &options.caller_field_name, &caller, options) {
                    state.logger.report(err);
                }
            }
        }
        self
    }

    /// [`source`](Self::source) with the location of the calling code.
    #[track_caller]
    pub fn caller(self) -> Self {
        let location = SourceLocation::caller();
        self.source(location)
    }

    /// Write the record to the logger's sink, or standard output.
    ///
    /// Write failures go through the logger's internal failure policy.
    ///
    /// # Aborts
    ///
    /// After a `Fatal` record is written, prints [`FATAL_MESSAGE`] and aborts
    /// the process, whichever thread sends it.
    pub fn send(self) {
        let Some(logger) = self.state.as_ref().map(|state| state.logger) else {
            return;
        };

        let result = match logger.sink() {
            Some(sink) => self.deliver(|record| write_record(&mut *sink.lock(), record)),
            None => self.deliver(|record| write_record(&mut io::stdout().lock(), record)),
        };
        if let Err(err) = result {
            logger.report(LoggerError::io_operation("writing record", err));
        }
    }

    /// Write the record to standard error.
    ///
    /// # Aborts
    ///
    /// As [`send`](Self::send).
    pub fn send_stderr(self) {
        let Some(logger) = self.state.as_ref().map(|state| state.logger) else {
            return;
        };

        if let Err(err) = self.deliver(|record| write_record(&mut io::stderr().lock(), record)) {
            logger.report(LoggerError::io_operation("writing record to stderr", err));
        }
    }

    /// Write the record to `writer`, returning any write error.
    ///
    /// # Aborts
    ///
    /// As [`send`](Self::send); a failed write returns the error instead.
    pub fn send_to<W>(self, writer: &mut W) -> io::Result<()>
    where
        W: Write + ?Sized,
    {
        self.deliver(|record| write_record(writer, record))
    }

    fn deliver<F>(self, write: F) -> io::Result<()>
    where
        F: FnOnce(&[u8]) -> io::Result<()>,
    {
        let level = self.level;
        let result = self.write_out(write);
        if result.is_ok() && level == Level::Fatal {
            fatal_exit();
        }
        result
    }

    /// Frame and write the record, returning the buffer to its pool.
    fn write_out<F>(self, write: F) -> io::Result<()>
    where
        F: FnOnce(&[u8]) -> io::Result<()>,
    {
        let Some(EntryState { logger, mut buf }) = self.state else {
            return Ok(());
        };

        match logger.options().format {
            Format::Json => buf.extend_from_slice(b"}\n"),
            Format::Simple => buf.push(b'\n'),
        }

        let result = write(&buf);
        match &result {
            Ok(()) => logger.metrics().record_written(buf.len()),
            Err(_) => logger.metrics().record_write_failure(),
        };
        drop(buf);
        result
    }
}

fn fatal_exit() -> ! {
    eprintln!("{}", FATAL_MESSAGE);
    process::abort()
}

impl fmt::Debug for Entry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("level", &self.level)
            .field("enabled", &self.is_enabled())
            .field("record", &String::from_utf8_lossy(self.as_bytes()))
            .finish()
    }
}

fn write_record<W: Write + ?Sized>(writer: &mut W, record: &[u8]) -> io::Result<()> {
    writer.write_all(record)?;
    writer.flush()
}
