//! Bounded probe pipeline.
//!
//! Each record pulled from the source takes one ticket from a counting
//! semaphore before its probe is spawned; the probe task owns the ticket and
//! drops it on every exit path. The run only returns once the `JoinSet` of
//! probes has drained.

use crate::error::SiteSearchError;
use crate::probe::{PageFetcher, TermMatcher};
use crate::record::HostRecord;
use futures::{Stream, StreamExt};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// Default maximum number of in-flight probes.
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Outcome of probing one host.
///
/// `found` is only `true` on a confirmed match; a failed probe reports
/// `found = false` and carries the error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub host: String,
    pub found: bool,
    pub error: Option<String>,
}

/// Format one result line (without the trailing newline).
pub fn format_result_line(term: &str, host: &str, found: bool) -> String {
    format!("Found term [{}] in [{}]: {}", term, host, found)
}

/// Line-oriented result sink shared by all probe tasks.
///
/// Every line is written while holding the lock, so lines from concurrent
/// probes never interleave.
pub struct ResultWriter<W> {
    term: String,
    inner: Mutex<W>,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(inner: W, term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            inner: Mutex::new(inner),
        }
    }

    /// Append one result line.
    pub fn write_result(&self, result: &ProbeResult) -> Result<(), SiteSearchError> {
        let line = format_result_line(&self.term, &result.host, result.found);
        let mut inner = self.lock()?;
        writeln!(inner, "{}", line)?;
        Ok(())
    }

    pub fn flush(&self) -> Result<(), SiteSearchError> {
        self.lock()?.flush()?;
        Ok(())
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> Result<W, SiteSearchError> {
        self.inner
            .into_inner()
            .map_err(|_| SiteSearchError::internal("result writer lock poisoned"))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, W>, SiteSearchError> {
        self.inner
            .lock()
            .map_err(|_| SiteSearchError::internal("result writer lock poisoned"))
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Hosts with a result line
    pub probed: usize,
    /// Hosts whose body matched the term
    pub found: usize,
    /// Probes that failed to retrieve content
    pub failed: usize,
}

impl RunSummary {
    pub fn not_found(&self) -> usize {
        self.probed - self.found
    }

    fn record(&mut self, result: &ProbeResult) {
        self.probed += 1;
        if result.found {
            self.found += 1;
        }
        if result.error.is_some() {
            self.failed += 1;
        }
    }
}

/// Probe one host. Never fails: fetch errors become a negative result.
pub async fn probe_host<F: PageFetcher>(
    fetcher: &F,
    matcher: &TermMatcher,
    host: String,
) -> ProbeResult {
    match fetcher.fetch(&host).await {
        Ok(body) => {
            let found = matcher.is_match(&body);
            debug!(host = %host, found, bytes = body.len(), "probe finished");
            ProbeResult {
                host,
                found,
                error: None,
            }
        }
        Err(e) => {
            warn!(host = %host, error = %e, "probe failed");
            ProbeResult {
                host,
                found: false,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Streams records into a fixed-size pool of concurrent probes.
pub struct ProbePipeline<F> {
    fetcher: Arc<F>,
    matcher: Arc<TermMatcher>,
    max_concurrency: usize,
}

impl<F: PageFetcher> ProbePipeline<F> {
    /// Create a pipeline allowing at most `max_concurrency` in-flight probes.
    pub fn new(
        fetcher: F,
        matcher: TermMatcher,
        max_concurrency: usize,
    ) -> Result<Self, SiteSearchError> {
        if max_concurrency == 0 {
            return Err(SiteSearchError::config(
                "Maximum concurrency must be at least 1",
            ));
        }

        Ok(Self {
            fetcher: Arc::new(fetcher),
            matcher: Arc::new(matcher),
            max_concurrency,
        })
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn matcher(&self) -> &TermMatcher {
        &self.matcher
    }

    /// Probe every record and write one line per record to `sink`.
    ///
    /// Lines appear in completion order. Returns after every launched probe
    /// has finished and the sink has been flushed. If the source yields a
    /// fatal error, no further records are admitted, in-flight probes still
    /// complete, and the error is returned.
    pub async fn run<S, T, W>(
        &self,
        records: S,
        sink: Arc<ResultWriter<W>>,
    ) -> Result<RunSummary, SiteSearchError>
    where
        S: Stream<Item = Result<T, SiteSearchError>>,
        T: HostRecord,
        W: Write + Send + 'static,
    {
        let tickets = Arc::new(Semaphore::new(self.max_concurrency));
        let mut probes: JoinSet<Result<ProbeResult, SiteSearchError>> = JoinSet::new();
        let mut summary = RunSummary::default();
        let mut failure: Option<SiteSearchError> = None;

        let mut records = std::pin::pin!(records);
        while let Some(item) = records.next().await {
            let record = match item {
                Ok(record) => record,
                Err(e) => {
                    error!(error = %e, "aborting run, waiting for in-flight probes");
                    failure = Some(e);
                    break;
                }
            };

            let ticket = Arc::clone(&tickets)
                .acquire_owned()
                .await
                .map_err(|_| SiteSearchError::internal("probe ticket pool closed"))?;

            let host = record.host().to_string();
            let fetcher = Arc::clone(&self.fetcher);
            let matcher = Arc::clone(&self.matcher);
            let sink = Arc::clone(&sink);

            probes.spawn(async move {
                let _ticket = ticket;
                let result = probe_host(fetcher.as_ref(), &matcher, host).await;
                sink.write_result(&result)?;
                Ok(result)
            });

            while let Some(done) = probes.try_join_next() {
                settle(done, &mut summary, &mut failure);
            }
        }

        while let Some(done) = probes.join_next().await {
            settle(done, &mut summary, &mut failure);
        }

        sink.flush()?;
        info!(
            probed = summary.probed,
            found = summary.found,
            failed = summary.failed,
            "probe run finished"
        );

        match failure {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}

fn settle(
    done: Result<Result<ProbeResult, SiteSearchError>, JoinError>,
    summary: &mut RunSummary,
    failure: &mut Option<SiteSearchError>,
) {
    match done {
        Ok(Ok(result)) => summary.record(&result),
        Ok(Err(e)) => {
            error!(error = %e, "failed to write result line");
            failure.get_or_insert(e);
        }
        Err(e) => {
            error!(error = %e, "probe task did not complete");
            failure.get_or_insert(SiteSearchError::internal(format!(
                "probe task did not complete: {}",
                e
            )));
        }
    }
}
