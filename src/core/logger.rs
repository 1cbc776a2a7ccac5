//! Main logger implementation

use super::attribute;
use super::buffer_pool::{BufferPool, PooledBuffer, DEFAULT_BUFFER_CAPACITY};
use super::entry::Entry;
use super::error::{LoggerError, Result};
use super::log_level::Level;
use super::metrics::LoggerMetrics;
use super::options::{Format, InternalFailure, LoggerOptions};
use crate::time::{TimeFormatting, TimePattern, Timestamp};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// Default sink shared by every entry a logger vends.
pub type SharedSink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Level-gated record factory.
///
/// Each level method returns an [`Entry`] whose buffer already holds the
/// record prefix. Entries below the configured level are inert and borrow
/// nothing from the pool.
///
/// # Example
///
/// ```
/// use zlog::prelude::*;
///
/// let logger = Logger::new(LoggerOptions::new().with_format(Format::Simple));
///
/// let mut out = Vec::new();
/// logger.info("ready").attr("port", &8080).send_to(&mut out).unwrap();
/// assert_eq!(out, b"INFO ready port=8080\n");
/// ```
pub struct Logger {
    options: LoggerOptions,
    pool: Option<Arc<BufferPool>>,
    /// Pre-rendered `with` fields, replayed after the record prefix
    static_fields: Vec<u8>,
    sink: Option<SharedSink>,
    /// Metrics for observability (records written, failures, gated entries)
    metrics: Arc<LoggerMetrics>,
    time_pattern: TimePattern,
}

impl Logger {
    /// Logger whose entries allocate a fresh buffer per record.
    #[must_use]
    pub fn new(options: LoggerOptions) -> Self {
        let time_pattern = TimePattern::compile(&options.time_pattern);
        Self {
            options,
            pool: None,
            static_fields: Vec::new(),
            sink: None,
            metrics: Arc::new(LoggerMetrics::new()),
            time_pattern,
        }
    }

    /// Logger whose entries borrow their buffers from `pool`.
    #[must_use]
    pub fn with_pool(pool: Arc<BufferPool>, options: LoggerOptions) -> Self {
        let mut logger = Self::new(options);
        logger.pool = Some(pool);
        logger
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use zlog::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .level(Level::Debug)
    ///     .format(Format::Simple)
    ///     .field("svc", "web")
    ///     .build();
    ///
    /// assert!(logger.enabled(Level::Debug));
    /// assert_eq!(logger.static_fields(), b" svc=\"web\"");
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn options(&self) -> &LoggerOptions {
        &self.options
    }

    pub fn pool(&self) -> Option<&Arc<BufferPool>> {
        self.pool.as_ref()
    }

    /// The default sink, when one was installed through the builder.
    pub fn sink(&self) -> Option<&SharedSink> {
        self.sink.as_ref()
    }

    /// The rendered static fields, as they appear in every record.
    pub fn static_fields(&self) -> &[u8] {
        &self.static_fields
    }

    /// Get logger metrics for monitoring
    ///
    /// ```
    /// use zlog::prelude::*;
    ///
    /// let logger = Logger::new(LoggerOptions::new().with_level(Level::Warn));
    /// logger.debug("skipped").send();
    ///
    /// assert_eq!(logger.metrics().entries_gated(), 1);
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Whether a record at `level` would be emitted.
    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        self.options.level.enables(level)
    }

    /// Add a field to every record this logger emits from now on.
    ///
    /// Meant for the configuration phase; entries already handed out keep
    /// the fields they were created with.
    pub fn with<V>(&mut self, name: &str, value: &V) -> &mut Self
    where
        V: Serialize + ?Sized,
    {
        if let Err(err) = attribute::write_attr(&mut self.static_fields, name, value, &self.options) {
            self.report(err);
        }
        self
    }

    #[inline]
    pub fn trace(&self, message: &str) -> Entry<'_> {
        self.begin(Level::Trace, message, None)
    }

    #[inline]
    pub fn debug(&self, message: &str) -> Entry<'_> {
        self.begin(Level::Debug, message, None)
    }

    #[inline]
    pub fn info(&self, message: &str) -> Entry<'_> {
        self.begin(Level::Info, message, None)
    }

    #[inline]
    pub fn warn(&self, message: &str) -> Entry<'_> {
        self.begin(Level::Warn, message, None)
    }

    /// Error record carrying `err` under the error field.
    #[inline]
    pub fn error(&self, message: &str, err: impl fmt::Display) -> Entry<'_> {
        self.begin(Level::Error, message, Some(&err))
    }

    /// Fatal record.
    ///
    /// # Aborts
    ///
    /// Once the returned entry is sent and the record written, the buffer is
    /// returned to the pool, [`FATAL_MESSAGE`](crate::FATAL_MESSAGE) is printed
    /// to standard error and the process aborts. There is no recovery, from
    /// any thread.
    #[inline]
    pub fn fatal(&self, message: &str) -> Entry<'_> {
        self.begin(Level::Fatal, message, None)
    }

    /// Record at an arbitrary level, without an error.
    pub fn log(&self, level: Level, message: &str) -> Entry<'_> {
        self.begin(level, message, None)
    }

    /// Flush the default sink, or standard output when none is installed.
    pub fn flush(&self) -> Result<()> {
        let result = match &self.sink {
            Some(sink) => sink.lock().flush(),
            None => io::stdout().flush(),
        };
        result.map_err(|err| LoggerError::io_operation("flushing sink", err))
    }

    /// Route an internal failure through the configured policy.
    pub(crate) fn report(&self, err: LoggerError) {
        self.metrics.record_internal_failure();
        match self.options.internal_failure {
            InternalFailure::Ignore => {}
            InternalFailure::PrintStderr => eprintln!("[LOGGER ERROR] {}", err),
            InternalFailure::Panic => panic!("[LOGGER ERROR] {}", err),
        }
    }

    fn begin(&self, level: Level, message: &str, err: Option<&dyn fmt::Display>) -> Entry<'_> {
        if !self.enabled(level) {
            self.metrics.record_gated();
            return Entry::disabled(level);
        }

        let mut buf = match &self.pool {
            Some(pool) => pool.acquire(),
            None => PooledBuffer::unpooled(DEFAULT_BUFFER_CAPACITY),
        };
        if let Err(err) = self.write_prefix(&mut buf, level, message, err) {
            self.report(err);
        }
        Entry::enabled(level, self, buf)
    }

    /// Time, level, message, error and static fields.
    fn write_prefix(
        &self,
        buf: &mut Vec<u8>,
        level: Level,
        message: &str,
        err: Option<&dyn fmt::Display>,
    ) -> Result<()> {
        let options = &self.options;
        match options.format {
            Format::Json => {
                buf.push(b'{');
                if options.time_enabled {
                    serde_json::to_writer(&mut *buf, &options.time_field_name)?;
                    buf.push(b':');
                    match self.time_field() {
                        TimeField::Raw(value) => write!(buf, "{}", value)?,
                        TimeField::Pattern(text) => serde_json::to_writer(&mut *buf, &text)?,
                    }
                    buf.extend_from_slice(b", ");
                }
                serde_json::to_writer(&mut *buf, &options.level_field_name)?;
                buf.extend_from_slice(b": ");
                serde_json::to_writer(&mut *buf, level.as_str())?;
            }
            Format::Simple => {
                if options.time_enabled {
                    match self.time_field() {
                        TimeField::Raw(value) => write!(buf, "{} ", value)?,
                        TimeField::Pattern(text) => {
                            buf.extend_from_slice(text.as_bytes());
                            buf.push(b' ');
                        }
                    }
                }
                buf.extend_from_slice(level.prefix().as_bytes());
                if !message.is_empty() {
                    buf.push(b' ');
                    buf.extend_from_slice(message.as_bytes());
                }
            }
        }

        if options.format == Format::Json && !message.is_empty() {
            attribute::write_str(buf, &options.message_field_name, message, options)?;
        }
        if let Some(err) = err {
            attribute::write_tag(buf, &options.error_field_name, &err.to_string(), options)?;
        }
        buf.extend_from_slice(&self.static_fields);
        Ok(())
    }

    fn time_field(&self) -> TimeField {
        let measure = self.options.time_measure;
        match self.options.time_formatting {
            TimeFormatting::Raw => TimeField::Raw(Timestamp::now(measure).value),
            TimeFormatting::Pattern => {
                let ts = match Timestamp::now_local(measure) {
                    Ok(ts) => ts,
                    Err(err) => {
                        self.report(err);
                        Timestamp::now(measure)
                    }
                };
                TimeField::Pattern(self.time_pattern.format(&ts))
            }
        }
    }
}

enum TimeField {
    Raw(i128),
    Pattern(String),
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("options", &self.options)
            .field("pool", &self.pool)
            .field("static_fields", &String::from_utf8_lossy(&self.static_fields))
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use zlog::prelude::*;
///
/// let logger = Logger::builder()
///     .options(LoggerOptions::new().with_caller_enabled(true))
///     .level(Level::Warn)
///     .pool(BufferPool::new().shared())
///     .sink(Vec::<u8>::new())
///     .build();
///
/// assert!(!logger.enabled(Level::Info));
/// assert!(logger.pool().is_some());
/// ```
pub struct LoggerBuilder {
    options: LoggerOptions,
    pool: Option<Arc<BufferPool>>,
    sink: Option<SharedSink>,
    fields: Vec<BuilderField>,
}

/// A builder field rendered for both formats; `build` keeps the one it needs.
struct BuilderField {
    json: Result<Vec<u8>>,
    simple: Result<Vec<u8>>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            options: LoggerOptions::default(),
            pool: None,
            sink: None,
            fields: Vec::new(),
        }
    }

    /// Replace the whole option set
    #[must_use = "builder methods return a new value"]
    pub fn options(mut self, options: LoggerOptions) -> Self {
        self.options = options;
        self
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: Level) -> Self {
        self.options.level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn format(mut self, format: Format) -> Self {
        self.options.format = format;
        self
    }

    /// Borrow record buffers from `pool`
    #[must_use = "builder methods return a new value"]
    pub fn pool(mut self, pool: Arc<BufferPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Default sink for [`Entry::send`]
    ///
    /// If not called, records go to standard output.
    #[must_use = "builder methods return a new value"]
    pub fn sink<W: Write + Send + 'static>(self, sink: W) -> Self {
        self.shared_sink(Arc::new(Mutex::new(Box::new(sink))))
    }

    /// Default sink that is also held elsewhere, e.g. to read back what was written
    #[must_use = "builder methods return a new value"]
    pub fn shared_sink(mut self, sink: SharedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Add a static field
    ///
    /// The value is rendered like [`Logger::with`] would render it, with the
    /// options set so far; the output format may still change before `build`.
    #[must_use = "builder methods return a new value"]
    pub fn field<V: Serialize + ?Sized>(mut self, name: &str, value: &V) -> Self {
        let format = self.options.format;
        let mut render = |format| {
            self.options.format = format;
            let mut out = Vec::new();
            attribute::write_attr(&mut out, name, value, &self.options).map(|()| out)
        };
        let field = BuilderField {
            json: render(Format::Json),
            simple: render(Format::Simple),
        };
        self.options.format = format;
        self.fields.push(field);
        self
    }

    /// Build the Logger
    pub fn build(self) -> Logger {
        let mut logger = Logger::new(self.options);
        logger.pool = self.pool;
        logger.sink = self.sink;

        for field in self.fields {
            let rendered = match logger.options.format {
                Format::Json => field.json,
                Format::Simple => field.simple,
            };
            match rendered {
                Ok(bytes) => logger.static_fields.extend_from_slice(&bytes),
                Err(err) => logger.report(err),
            }
        }

        logger
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
