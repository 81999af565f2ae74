//! Site Search CLI Application
//!
//! Reads a CSV host list, probes every host over HTTP for a search term
//! with bounded concurrency, and writes one result line per host.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use site_search_lib::{
    delimiter_byte, load_env_config, parse_duration, ConfigManager, FileConfig, HttpFetcher,
    ProbeConfig, ProbePipeline, RecordStream, ResultWriter, RunSummary, SiteRow, SiteSearchError,
    TermMatcher,
};
use std::fs::File;
use std::io::BufWriter;
use std::process;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for site-search
#[derive(Parser, Debug)]
#[command(name = "site-search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search a list of websites for a term")]
#[command(
    long_about = "Probe every host in a CSV list over plain HTTP and report whether the search term (a regular expression) appears in the response body.\n\nThe first row of the list is a header; each data row has six columns: rank, URL, root domains, external links, mozRank, mozTrust."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Search term (regular expression)
    #[arg(short = 's', long = "search", value_name = "TERM", help_heading = "Search")]
    pub search: Option<String>,

    /// Maximum concurrent probes [default: 20]
    #[arg(short = 'c', long = "concurrency", value_name = "N", help_heading = "Performance")]
    pub concurrency: Option<usize>,

    /// Per-request timeout, e.g. "10s" or "1m" [default: 10s]
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Path to URL list file [default: url.txt]
    #[arg(short = 'i', long = "input", value_name = "FILE", help_heading = "Files")]
    pub input: Option<String>,

    /// Path to results file [default: results.txt]
    #[arg(short = 'o', long = "output", value_name = "FILE", help_heading = "Files")]
    pub output: Option<String>,

    /// Column delimiter of the URL list [default: ,]
    #[arg(long = "delimiter", value_name = "CHAR", help_heading = "Files")]
    pub delimiter: Option<char>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show debug logging for every record and probe
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(&args);

    if let Err(e) = validate_args(&args) {
        ui::print_error(&e);
        process::exit(1);
    }

    if let Err(e) = run(args).await {
        ui::print_error(&e.to_string());
        process::exit(1);
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the flag-derived level.
fn init_tracing(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("site_search={level},site_search_lib={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if args.concurrency == Some(0) {
        return Err("--concurrency must be at least 1".to_string());
    }

    if let Some(timeout) = &args.timeout {
        if parse_duration(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                timeout
            ));
        }
    }

    if let Some(delimiter) = args.delimiter {
        delimiter_byte(delimiter).map_err(|e| e.to_string())?;
    }

    Ok(())
}

/// Run one probe pass over the host list.
async fn run(args: Args) -> Result<RunSummary, SiteSearchError> {
    let config = build_config(&args)?;
    config.validate()?;

    // Compile the term before touching any file so a bad pattern fails fast
    let matcher = TermMatcher::new(&config.search_term)?;
    let fetcher = HttpFetcher::new(config.timeout)?;
    let pipeline = ProbePipeline::new(fetcher, matcher, config.concurrency)?;

    let records: RecordStream<SiteRow> = RecordStream::open(&config.input_path, config.delimiter)?;

    let outfile = File::create(&config.output_path).map_err(|e| {
        SiteSearchError::file_error(
            &config.output_path,
            format!("Failed to create results file: {}", e),
        )
    })?;
    let sink = Arc::new(ResultWriter::new(
        BufWriter::new(outfile),
        config.search_term.as_str(),
    ));

    if args.verbose {
        ui::print_header(&config);
    }

    let start_time = Instant::now();
    let summary = pipeline.run(records, sink).await?;
    ui::print_summary(&summary, start_time.elapsed(), &config.output_path);

    Ok(summary)
}

/// Build ProbeConfig from CLI arguments with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (SS_*)
/// 3. Local config file (./site-search.toml or ./.site-search.toml)
/// 4. Global config file (~/.site-search.toml)
/// 5. XDG config file (~/.config/site-search/config.toml)
/// 6. Built-in defaults
fn build_config(args: &Args) -> Result<ProbeConfig, SiteSearchError> {
    let config_manager = ConfigManager::new(args.verbose);
    let env_config = load_env_config(args.verbose);

    let file_config = if let Some(path) = args.config.as_ref().or(env_config.config.as_ref()) {
        tracing::info!(path = %path, "using explicit config file");
        config_manager.load_file(path)?
    } else {
        config_manager.discover_and_load()?
    };

    let mut config = merge_file_config_into_probe_config(ProbeConfig::default(), file_config)?;

    // Environment variables
    if let Some(term) = env_config.search_term {
        config.search_term = term;
    }
    if let Some(concurrency) = env_config.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(input) = env_config.input {
        config.input_path = input;
    }
    if let Some(output) = env_config.output {
        config.output_path = output;
    }
    if let Some(timeout) = env_config.timeout {
        config.timeout = timeout;
    }

    apply_cli_args_to_config(config, args)
}

/// Apply the `[defaults]` table of the merged config files.
fn merge_file_config_into_probe_config(
    mut config: ProbeConfig,
    file_config: FileConfig,
) -> Result<ProbeConfig, SiteSearchError> {
    let Some(defaults) = file_config.defaults else {
        return Ok(config);
    };

    if let Some(term) = defaults.search_term {
        config.search_term = term;
    }
    if let Some(concurrency) = defaults.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(input) = defaults.input {
        config.input_path = input;
    }
    if let Some(output) = defaults.output {
        config.output_path = output;
    }
    if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_duration) {
        config.timeout = timeout;
    }
    if let Some(delimiter) = defaults.delimiter {
        config.delimiter = delimiter_byte(delimiter)?;
    }

    Ok(config)
}

/// Apply CLI arguments to config (highest precedence).
fn apply_cli_args_to_config(
    mut config: ProbeConfig,
    args: &Args,
) -> Result<ProbeConfig, SiteSearchError> {
    if let Some(term) = &args.search {
        config.search_term = term.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(input) = &args.input {
        config.input_path = input.clone();
    }
    if let Some(output) = &args.output {
        config.output_path = output.clone();
    }
    if let Some(timeout) = &args.timeout {
        config.timeout = parse_duration(timeout).ok_or_else(|| {
            SiteSearchError::config(format!("Invalid timeout '{}'", timeout))
        })?;
    }
    if let Some(delimiter) = args.delimiter {
        config.delimiter = delimiter_byte(delimiter)?;
    }

    Ok(config)
}
