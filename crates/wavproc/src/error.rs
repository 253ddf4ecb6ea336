//! Error types for the WAV stream engine.

use thiserror::Error;

/// Result type for stream operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Errors that can occur while parsing, reading, writing or processing streams.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The container or its format chunk is malformed or unsupported.
    #[error("format error: {message}")]
    Format {
        /// Error message.
        message: String,
    },

    /// An operation was attempted out of order.
    #[error("sequence error: {message}")]
    Sequence {
        /// Error message.
        message: String,
    },

    /// The combinator asked for an input that was never registered.
    #[error("unknown input stream '{name}'")]
    UnknownInput {
        /// Requested input name.
        name: String,
    },

    /// I/O error on the underlying handle.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AudioError {
    /// Creates a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Creates a sequence error.
    pub fn sequence(message: impl Into<String>) -> Self {
        Self::Sequence {
            message: message.into(),
        }
    }

    /// Stable error code for reporting.
    pub fn code(&self) -> &'static str {
        match self {
            AudioError::Format { .. } => "WAV_001",
            AudioError::Sequence { .. } => "WAV_002",
            AudioError::UnknownInput { .. } => "WAV_003",
            AudioError::Io(_) => "WAV_004",
        }
    }

    /// Returns true for errors caused by the stream contents rather than the handle.
    pub fn is_format(&self) -> bool {
        matches!(self, AudioError::Format { .. })
    }
}
