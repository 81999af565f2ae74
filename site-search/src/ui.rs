//! Terminal output for the site-search CLI.
//!
//! Result lines go to the results file; this module only prints the run
//! header, the closing summary and fatal errors. Uses only the `console`
//! crate.

use console::style;
use site_search_lib::{ProbeConfig, RunSummary};
use std::time::Duration;

/// Print the run parameters before probing starts (verbose mode).
pub fn print_header(config: &ProbeConfig) {
    let term = if config.search_term.is_empty() {
        "(any)".to_string()
    } else {
        config.search_term.clone()
    };

    println!(
        "{} {} {} {}",
        style("Searching").bold(),
        style(&config.input_path).cyan(),
        style("for").bold(),
        style(term).yellow()
    );
    println!(
        "  concurrency {}, timeout {:?}, results in {}",
        config.concurrency,
        config.timeout,
        style(&config.output_path).cyan()
    );
    println!();
}

/// Print the closing summary line.
pub fn print_summary(summary: &RunSummary, duration: Duration, output_path: &str) {
    println!("{}", format_summary(summary, duration, output_path));
}

fn format_summary(summary: &RunSummary, duration: Duration, output_path: &str) -> String {
    let errors = if summary.failed > 0 {
        style(format!("{} errors", summary.failed)).red().to_string()
    } else {
        style("0 errors").dim().to_string()
    };

    format!(
        "{} {} hosts probed, {} found, {} not found ({}) in {}, results in {}",
        style("Summary:").bold(),
        summary.probed,
        style(summary.found).green().bold(),
        summary.not_found(),
        errors,
        format_duration(duration),
        output_path
    )
}

/// Print a fatal error to stderr.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), message);
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 60 {
        format!("{}m{:02}s", duration.as_secs() / 60, duration.as_secs() % 60)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}
