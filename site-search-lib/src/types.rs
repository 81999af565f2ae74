//! Run configuration.

use crate::error::SiteSearchError;
use crate::pipeline::DEFAULT_CONCURRENCY;
use std::time::Duration;

/// Default host list path.
pub const DEFAULT_INPUT_PATH: &str = "url.txt";

/// Default results path.
pub const DEFAULT_OUTPUT_PATH: &str = "results.txt";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration options for a probe run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    /// Regular expression searched for in every body.
    /// Default: empty (matches everything)
    pub search_term: String,

    /// Maximum number of in-flight probes.
    /// Default: 20
    pub concurrency: usize,

    /// Delimited host list with one header row.
    /// Default: "url.txt"
    pub input_path: String,

    /// Line-oriented results file, truncated on start.
    /// Default: "results.txt"
    pub output_path: String,

    /// Timeout for each HTTP request.
    /// Default: 10 seconds
    pub timeout: Duration,

    /// Column delimiter of the host list.
    /// Default: ','
    pub delimiter: u8,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            concurrency: DEFAULT_CONCURRENCY,
            input_path: DEFAULT_INPUT_PATH.to_string(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
            delimiter: b',',
        }
    }
}

impl ProbeConfig {
    pub fn with_search_term<S: Into<String>>(mut self, term: S) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_input_path<S: Into<String>>(mut self, path: S) -> Self {
        self.input_path = path.into();
        self
    }

    pub fn with_output_path<S: Into<String>>(mut self, path: S) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Check the settings that would otherwise only fail mid-run.
    pub fn validate(&self) -> Result<(), SiteSearchError> {
        if self.concurrency == 0 {
            return Err(SiteSearchError::config("Concurrency must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(SiteSearchError::config("Timeout must be greater than zero"));
        }
        if self.input_path.trim().is_empty() {
            return Err(SiteSearchError::config("Input path cannot be empty"));
        }
        if self.output_path.trim().is_empty() {
            return Err(SiteSearchError::config("Output path cannot be empty"));
        }
        if matches!(self.delimiter, b'"' | b'\n' | b'\r') {
            return Err(SiteSearchError::config(format!(
                "Invalid delimiter {:?}",
                self.delimiter as char
            )));
        }
        Ok(())
    }
}

/// Convert a single-character delimiter to the byte the CSV reader expects.
pub fn delimiter_byte(delimiter: char) -> Result<u8, SiteSearchError> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(SiteSearchError::config(format!(
            "Delimiter {:?} must be a single ASCII character",
            delimiter
        )))
    }
}
