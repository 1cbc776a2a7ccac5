//! Logger configuration
//!
//! [`LoggerOptions`] is fixed once a [`Logger`](super::Logger) is built. It
//! can be assembled with the `with_*` setters or loaded from JSON, where
//! every field is optional and falls back to its default.

use super::caller::{default_marshal, SourceLocation};
use super::error::{LoggerError, Result};
use super::log_level::Level;
use crate::time::{TimeFormatting, TimeMeasure};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Record layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// `INFO message key=value`
    Simple,
    /// One JSON object per line
    #[default]
    Json,
}

/// What to do when a record cannot be rendered or written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InternalFailure {
    /// Carry on with whatever was rendered
    #[default]
    Ignore,
    /// Panic with the error text
    Panic,
    /// Report on standard error and carry on
    PrintStderr,
}

impl fmt::Display for InternalFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternalFailure::Ignore => write!(f, "Ignore"),
            InternalFailure::Panic => write!(f, "Panic"),
            InternalFailure::PrintStderr => write!(f, "PrintStderr"),
        }
    }
}

/// Renders a call site for the caller field.
pub type CallerMarshalFn = Arc<dyn Fn(&SourceLocation) -> String + Send + Sync>;

/// Logger configuration
///
/// # Examples
///
/// ```
/// use zlog::{Format, Level, LoggerOptions};
///
/// let options = LoggerOptions::new()
///     .with_level(Level::Debug)
///     .with_format(Format::Simple)
///     .with_caller_enabled(true);
///
/// assert_eq!(options.level, Level::Debug);
/// assert_eq!(options.caller_field_name, "caller");
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerOptions {
    /// Lowest level that is emitted
    pub level: Level,
    pub level_field_name: String,
    pub format: Format,

    /// Whether records carry a time field
    pub time_enabled: bool,
    pub time_field_name: String,
    pub time_measure: TimeMeasure,
    pub time_formatting: TimeFormatting,
    /// Pattern used when `time_formatting` is `Pattern`
    pub time_pattern: String,

    pub message_field_name: String,
    pub error_field_name: String,
    pub internal_failure: InternalFailure,

    /// Whether `Entry::source` attaches the call site
    pub caller_enabled: bool,
    pub caller_field_name: String,
    #[serde(skip)]
    pub caller_marshal_fn: Option<CallerMarshalFn>,

    /// Whether compound values in Simple records are quoted and escaped
    pub struct_escape_enabled: bool,
    pub struct_escape_src: String,
    pub struct_escape_dst: String,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            level: Level::Info,
            level_field_name: "level".to_string(),
            format: Format::Json,
            time_enabled: false,
            time_field_name: "time".to_string(),
            time_measure: TimeMeasure::Seconds,
            time_formatting: TimeFormatting::Raw,
            time_pattern: "DD/MM/YYYY'T'HH:mm:ss".to_string(),
            message_field_name: "message".to_string(),
            error_field_name: "error".to_string(),
            internal_failure: InternalFailure::Ignore,
            caller_enabled: false,
            caller_field_name: "caller".to_string(),
            caller_marshal_fn: None,
            struct_escape_enabled: false,
            struct_escape_src: "\"".to_string(),
            struct_escape_dst: "\\\"".to_string(),
        }
    }
}

impl fmt::Debug for LoggerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerOptions")
            .field("level", &self.level)
            .field("level_field_name", &self.level_field_name)
            .field("format", &self.format)
            .field("time_enabled", &self.time_enabled)
            .field("time_field_name", &self.time_field_name)
            .field("time_measure", &self.time_measure)
            .field("time_formatting", &self.time_formatting)
            .field("time_pattern", &self.time_pattern)
            .field("message_field_name", &self.message_field_name)
            .field("error_field_name", &self.error_field_name)
            .field("internal_failure", &self.internal_failure)
            .field("caller_enabled", &self.caller_enabled)
            .field("caller_field_name", &self.caller_field_name)
            .field("caller_marshal_fn", &self.caller_marshal_fn.as_ref().map(|_| "<fn>"))
            .field("struct_escape_enabled", &self.struct_escape_enabled)
            .field("struct_escape_src", &self.struct_escape_src)
            .field("struct_escape_dst", &self.struct_escape_dst)
            .finish()
    }
}

impl LoggerOptions {
    /// Create options with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON document; absent fields keep their defaults.
    ///
    /// ```
    /// use zlog::{Format, Level, LoggerOptions};
    ///
    /// let options = LoggerOptions::from_json(r#"{"level":"debug","format":"simple"}"#).unwrap();
    /// assert_eq!(options.level, Level::Debug);
    /// assert_eq!(options.format, Format::Simple);
    /// assert_eq!(options.message_field_name, "message");
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject configurations that cannot produce well-formed records.
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("level_field_name", &self.level_field_name),
            ("time_field_name", &self.time_field_name),
            ("message_field_name", &self.message_field_name),
            ("error_field_name", &self.error_field_name),
            ("caller_field_name", &self.caller_field_name),
        ];
        for (field, value) in names {
            if value.is_empty() {
                return Err(LoggerError::config("LoggerOptions", format!("{} must not be empty", field)));
            }
        }
        if self.struct_escape_enabled && self.struct_escape_src.is_empty() {
            return Err(LoggerError::config(
                "LoggerOptions",
                "struct_escape_src must not be empty when escaping is enabled",
            ));
        }
        Ok(())
    }

    /// Render a call site with the configured marshaller.
    pub fn marshal_caller(&self, location: &SourceLocation) -> String {
        match &self.caller_marshal_fn {
            Some(marshal) => marshal(location),
            None => default_marshal(location),
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_level_field_name(mut self, name: impl Into<String>) -> Self {
        self.level_field_name = name.into();
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Enable the time field
    #[must_use]
    pub fn with_time_enabled(mut self, enabled: bool) -> Self {
        self.time_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_time_field_name(mut self, name: impl Into<String>) -> Self {
        self.time_field_name = name.into();
        self
    }

    #[must_use]
    pub fn with_time_measure(mut self, measure: TimeMeasure) -> Self {
        self.time_measure = measure;
        self
    }

    #[must_use]
    pub fn with_time_formatting(mut self, formatting: TimeFormatting) -> Self {
        self.time_formatting = formatting;
        self
    }

    /// Render the time field with `pattern`; implies `TimeFormatting::Pattern`.
    #[must_use]
    pub fn with_time_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.time_pattern = pattern.into();
        self.time_formatting = TimeFormatting::Pattern;
        self
    }

    #[must_use]
    pub fn with_message_field_name(mut self, name: impl Into<String>) -> Self {
        self.message_field_name = name.into();
        self
    }

    #[must_use]
    pub fn with_error_field_name(mut self, name: impl Into<String>) -> Self {
        self.error_field_name = name.into();
        self
    }

    #[must_use]
    pub fn with_internal_failure(mut self, policy: InternalFailure) -> Self {
        self.internal_failure = policy;
        self
    }

    #[must_use]
    pub fn with_caller_enabled(mut self, enabled: bool) -> Self {
        self.caller_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_caller_field_name(mut self, name: impl Into<String>) -> Self {
        self.caller_field_name = name.into();
        self
    }

    /// Replace the `file:line` caller rendering
    #[must_use]
    pub fn with_caller_marshal_fn<F>(mut self, marshal: F) -> Self
    where
        F: Fn(&SourceLocation) -> String + Send + Sync + 'static,
    {
        self.caller_marshal_fn = Some(Arc::new(marshal));
        self
    }

    /// Quote compound values in Simple records, replacing `src` with `dst`
    #[must_use]
    pub fn with_struct_escape(mut self, src: impl Into<String>, dst: impl Into<String>) -> Self {
        self.struct_escape_enabled = true;
        self.struct_escape_src = src.into();
        self.struct_escape_dst = dst.into();
        self
    }

    #[must_use]
    pub fn with_struct_escape_enabled(mut self, enabled: bool) -> Self {
        self.struct_escape_enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = LoggerOptions::default();
        assert_eq!(options.level, Level::Info);
        assert_eq!(options.level_field_name, "level");
        assert_eq!(options.format, Format::Json);
        assert!(!options.time_enabled);
        assert_eq!(options.time_field_name, "time");
        assert_eq!(options.time_measure, TimeMeasure::Seconds);
        assert_eq!(options.time_formatting, TimeFormatting::Raw);
        assert_eq!(options.time_pattern, "DD/MM/YYYY'T'HH:mm:ss");
        assert_eq!(options.message_field_name, "message");
        assert_eq!(options.error_field_name, "error");
        assert_eq!(options.internal_failure, InternalFailure::Ignore);
        assert!(!options.caller_enabled);
        assert_eq!(options.caller_field_name, "caller");
        assert!(options.caller_marshal_fn.is_none());
        assert!(!options.struct_escape_enabled);
        assert_eq!(options.struct_escape_src, "\"");
        assert_eq!(options.struct_escape_dst, "\\\"");
    }

    #[test]
    fn test_builder_pattern() {
        let options = LoggerOptions::new()
            .with_level(Level::Trace)
            .with_format(Format::Simple)
            .with_time_enabled(true)
            .with_time_measure(TimeMeasure::Millis)
            .with_time_pattern("HH:mm")
            .with_internal_failure(InternalFailure::PrintStderr)
            .with_struct_escape("'", "\\'");

        assert_eq!(options.level, Level::Trace);
        assert_eq!(options.format, Format::Simple);
        assert!(options.time_enabled);
        assert_eq!(options.time_measure, TimeMeasure::Millis);
        assert_eq!(options.time_formatting, TimeFormatting::Pattern);
        assert_eq!(options.time_pattern, "HH:mm");
        assert_eq!(options.internal_failure, InternalFailure::PrintStderr);
        assert!(options.struct_escape_enabled);
        assert_eq!(options.struct_escape_src, "'");
    }

    #[test]
    fn test_marshal_caller() {
        let location = SourceLocation::new("src/main.rs", 7);
        assert_eq!(LoggerOptions::new().marshal_caller(&location), "src/main.rs:7");

        let options = LoggerOptions::new().with_caller_marshal_fn(|loc| format!("{}@{}", loc.line, loc.file));
        assert_eq!(options.marshal_caller(&location), "7@src/main.rs");
    }

    #[test]
    fn test_from_json() {
        let options = LoggerOptions::from_json(
            r#"{"level":"WARNING","format":"simple","time_enabled":true,
                "time_measure":"nanos","internal_failure":"print_stderr"}"#,
        )
        .unwrap();

        assert_eq!(options.level, Level::Warn);
        assert_eq!(options.format, Format::Simple);
        assert!(options.time_enabled);
        assert_eq!(options.time_measure, TimeMeasure::Nanos);
        assert_eq!(options.internal_failure, InternalFailure::PrintStderr);
        assert_eq!(options.error_field_name, "error");
    }

    #[test]
    fn test_from_json_unknown_level_disables() {
        let options = LoggerOptions::from_json(r#"{"level":"verbose"}"#).unwrap();
        assert_eq!(options.level, Level::Disabled);
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(LoggerOptions::from_json("{"), Err(LoggerError::JsonError(_))));
        assert!(matches!(
            LoggerOptions::from_json(r#"{"message_field_name":""}"#),
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_serialize_skips_marshaller() {
        let options = LoggerOptions::new().with_caller_marshal_fn(|_| String::new());
        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains(r#""level":"info""#));
        assert!(!json.contains("marshal"));
    }

    #[test]
    fn test_internal_failure_display() {
        assert_eq!(InternalFailure::Ignore.to_string(), "Ignore");
        assert_eq!(InternalFailure::Panic.to_string(), "Panic");
        assert_eq!(InternalFailure::PrintStderr.to_string(), "PrintStderr");
    }
}
