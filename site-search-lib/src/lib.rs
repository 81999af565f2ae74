//! # Site Search Library
//!
//! Probes a CSV list of web hosts over HTTP for a search term, writing one
//! result line per host while bounding the number of concurrent requests.
//!
//! The pipeline has three stages:
//!
//! - **Record decoding**: [`RecordReader`] maps each CSV row onto a statically
//!   shaped [`Record`], reporting field-count and type errors precisely.
//! - **Record streaming**: [`RecordStream`] decodes on a dedicated producer
//!   and hands records over a single-slot channel.
//! - **Bounded probing**: [`ProbePipeline`] runs at most N probes at once and
//!   appends each result to a shared [`ResultWriter`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use site_search_lib::{
//!     HttpFetcher, ProbePipeline, RecordStream, ResultWriter, SiteRow, TermMatcher,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let records: RecordStream<SiteRow> = RecordStream::open("url.txt", b',')?;
//!     let sink = Arc::new(ResultWriter::new(std::io::stdout(), "golang"));
//!
//!     let pipeline = ProbePipeline::new(
//!         HttpFetcher::new(Duration::from_secs(10))?,
//!         TermMatcher::new("golang")?,
//!         20,
//!     )?;
//!     let summary = pipeline.run(records, sink).await?;
//!     println!("{} hosts probed", summary.probed);
//!     Ok(())
//! }
//! ```

// Re-export main public API types and functions
pub use config::{
    load_env_config, parse_duration, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
};
pub use decode::{decode_row, RecordReader};
pub use error::{DecodeError, SiteSearchError};
pub use pipeline::{
    format_result_line, probe_host, ProbePipeline, ProbeResult, ResultWriter, RunSummary,
    DEFAULT_CONCURRENCY,
};
pub use probe::{probe_url, HttpFetcher, PageFetcher, TermMatcher};
pub use record::{
    validate_shape, FieldKind, FieldSpec, FieldType, FieldValue, HostRecord, Record, SiteRow,
};
pub use stream::RecordStream;
pub use types::{
    delimiter_byte, ProbeConfig, DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_PATH, DEFAULT_TIMEOUT,
};

// Internal modules - exposed through the re-exports above
mod config;
mod decode;
mod error;
mod pipeline;
mod probe;
mod record;
mod stream;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SiteSearchError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
