//! Error handling for decoding and probing operations.
//!
//! Two layers: [`DecodeError`] describes why a single CSV row could not be
//! mapped onto a record shape, and [`SiteSearchError`] covers everything that
//! can go wrong during a run, from a malformed host list to a failed probe.

use std::fmt;
use std::num::ParseIntError;
use std::time::Duration;

/// Failure to decode one tabular row into a record shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The row has a different number of columns than the shape has fields.
    FieldMismatch { expected: usize, found: usize },

    /// The shape declares a field type the decoder cannot populate.
    UnsupportedType { type_name: String },

    /// An integer column did not hold a base-10 signed integer.
    InvalidInteger(ParseIntError),

    /// The underlying CSV reader failed to produce a row.
    Read { message: String },
}

impl DecodeError {
    /// Create a new unsupported type error.
    pub fn unsupported_type<T: Into<String>>(type_name: T) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldMismatch { expected, found } => {
                write!(
                    f,
                    "CSV line fields mismatch. Expected {} found {}",
                    expected, found
                )
            }
            Self::UnsupportedType { type_name } => write!(f, "Unsupported type: {}", type_name),
            Self::InvalidInteger(err) => write!(f, "{}", err),
            Self::Read { message } => write!(f, "CSV read error: {}", message),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidInteger(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseIntError> for DecodeError {
    fn from(err: ParseIntError) -> Self {
        Self::InvalidInteger(err)
    }
}

impl From<csv::Error> for DecodeError {
    fn from(err: csv::Error) -> Self {
        Self::Read {
            message: err.to_string(),
        }
    }
}

/// Main error type for a site search run.
///
/// Decode, header, configuration and file errors are fatal to the run.
/// Network and timeout errors only ever describe a single probe and are
/// turned into a negative result by the pipeline.
#[derive(Debug, Clone)]
pub enum SiteSearchError {
    /// A data row could not be decoded
    Decode {
        line: Option<u64>,
        source: DecodeError,
    },

    /// The header row is missing or unreadable
    HeaderError { message: String },

    /// Configuration errors (invalid settings, unreadable config files)
    ConfigError { message: String },

    /// File I/O errors on the host list or the results file
    FileError { path: String, message: String },

    /// Network-related errors (connection, body read, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// A probe exceeded its request timeout
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// The search term is not a valid regular expression
    PatternError { pattern: String, message: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl SiteSearchError {
    /// Create a new decode error tied to a source line.
    pub fn decode(line: u64, source: DecodeError) -> Self {
        Self::Decode {
            line: Some(line),
            source,
        }
    }

    /// Create a new header error.
    pub fn header<M: Into<String>>(message: M) -> Self {
        Self::HeaderError {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole run rather than a single probe.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NetworkError { .. } | Self::Timeout { .. })
    }
}

impl fmt::Display for SiteSearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode { line, source } => match line {
                Some(line) => write!(f, "Decode error on line {}: {}", line, source),
                None => write!(f, "Decode error: {}", source),
            },
            Self::HeaderError { message } => write!(f, "Header error: {}", message),
            Self::ConfigError { message } => write!(f, "Configuration error: {}", message),
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::PatternError { pattern, message } => {
                write!(f, "Invalid search term '{}': {}", pattern, message)
            }
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for SiteSearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DecodeError> for SiteSearchError {
    fn from(err: DecodeError) -> Self {
        Self::Decode {
            line: None,
            source: err,
        }
    }
}

impl From<std::io::Error> for SiteSearchError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
