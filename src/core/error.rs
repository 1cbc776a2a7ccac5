//! Error types for the logger system

use crate::time::zoneinfo::ZoneInfoError;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {source}")]
    IoOperation {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Attribute could not be rendered into the record
    #[error("Failed to serialize attribute '{name}': {message}")]
    SerializeError { name: String, message: String },

    /// Time pattern could not be rendered
    #[error("Time format error: {0}")]
    TimeFormatError(String),

    /// Local timezone could not be resolved
    #[error("Zoneinfo error: {0}")]
    ZoneInfo(#[from] ZoneInfoError),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(operation: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            source,
        }
    }

    /// Create an attribute serialization error
    pub fn serialize(name: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::SerializeError {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a time format error
    pub fn time_format(message: impl Into<String>) -> Self {
        LoggerError::TimeFormatError(message.into())
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }
}
