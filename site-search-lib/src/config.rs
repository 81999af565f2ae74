//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and
//! `SS_*` environment variables, and merging file configurations with
//! proper precedence rules.

use crate::error::SiteSearchError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Host list path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Results path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Request timeout (as string, e.g., "10s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which files were loaded
    pub verbose: bool,
}

impl ConfigManager {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load and validate configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, SiteSearchError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SiteSearchError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            SiteSearchError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            SiteSearchError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        if self.verbose {
            info!(path = %path.display(), "loaded configuration file");
        }

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is lowest, then the home directory, then the current
    /// directory. Unreadable or invalid files are skipped with a warning.
    pub fn discover_and_load(&self) -> Result<FileConfig, SiteSearchError> {
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        let mut merged_config = FileConfig::default();
        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => merged_config = self.merge_configs(merged_config, config),
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring config file"),
            }
        }

        Ok(merged_config)
    }

    /// Looks for configuration files in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./site-search.toml", "./.site-search.toml"]
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Looks for configuration files in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".site-search.toml", "site-search.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("site-search").join("config.toml");
        path.exists().then_some(path)
    }

    /// Values from `higher` take precedence over values from `lower`.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        let defaults = match (lower.defaults, higher.defaults) {
            (Some(lower), Some(higher)) => Some(DefaultsConfig {
                search_term: higher.search_term.or(lower.search_term),
                concurrency: higher.concurrency.or(lower.concurrency),
                input: higher.input.or(lower.input),
                output: higher.output.or(lower.output),
                timeout: higher.timeout.or(lower.timeout),
                delimiter: higher.delimiter.or(lower.delimiter),
            }),
            (lower, higher) => higher.or(lower),
        };

        FileConfig { defaults }
    }

    fn validate_config(&self, config: &FileConfig) -> Result<(), SiteSearchError> {
        let Some(defaults) = &config.defaults else {
            return Ok(());
        };

        if defaults.concurrency == Some(0) {
            return Err(SiteSearchError::config("Concurrency must be at least 1"));
        }

        if let Some(timeout_str) = &defaults.timeout {
            if parse_duration(timeout_str).is_none() {
                return Err(SiteSearchError::config(format!(
                    "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                    timeout_str
                )));
            }
        }

        if let Some(delimiter) = defaults.delimiter {
            if !delimiter.is_ascii() {
                return Err(SiteSearchError::config(format!(
                    "Delimiter {:?} must be a single ASCII character",
                    delimiter
                )));
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub search_term: Option<String>,
    pub concurrency: Option<usize>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub timeout: Option<Duration>,
    pub config: Option<String>,
}

/// Load configuration from `SS_*` environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    load_env_config_from(verbose, |key| env::var(key).ok())
}

fn load_env_config_from<F>(verbose: bool, lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(term) = lookup("SS_TERM") {
        env_config.search_term = Some(term);
    }

    if let Some(val) = lookup("SS_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if concurrency > 0 => env_config.concurrency = Some(concurrency),
            _ => warn!(value = %val, "ignoring invalid SS_CONCURRENCY, must be a positive integer"),
        }
    }

    for (key, slot) in [
        ("SS_INPUT", &mut env_config.input),
        ("SS_OUTPUT", &mut env_config.output),
        ("SS_CONFIG", &mut env_config.config),
    ] {
        if let Some(val) = lookup(key) {
            if val.trim().is_empty() {
                warn!(key, "ignoring empty path");
            } else {
                *slot = Some(val);
            }
        }
    }

    if let Some(val) = lookup("SS_TIMEOUT") {
        match parse_duration(&val) {
            Some(timeout) => env_config.timeout = Some(timeout),
            None => warn!(value = %val, "ignoring invalid SS_TIMEOUT"),
        }
    }

    if verbose && env_config != EnvConfig::default() {
        info!(?env_config, "applied environment configuration");
    }

    env_config
}

/// Parse a duration string like "5s", "30s", "2m". A bare number is seconds.
///
/// Returns `None` for malformed or zero durations.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    let secs = if let Some(secs) = value.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        value.parse::<u64>().ok()
    }?;

    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("30S"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("10"), Some(Duration::from_secs(10)));
        assert_eq!(parse_duration("0s"), None);
        assert_eq!(parse_duration("invalid"), None);
    }

    #[test]
    fn test_load_valid_config() {
        let temp_file = config_file(
            r#"
[defaults]
search_term = "golang"
concurrency = 5
input = "hosts.csv"
output = "found.txt"
timeout = "3s"
delimiter = ";"
"#,
        );

        let manager = ConfigManager::new(false);
        let config = manager.load_file(temp_file.path()).unwrap();
        let defaults = config.defaults.unwrap();

        assert_eq!(defaults.search_term.as_deref(), Some("golang"));
        assert_eq!(defaults.concurrency, Some(5));
        assert_eq!(defaults.input.as_deref(), Some("hosts.csv"));
        assert_eq!(defaults.output.as_deref(), Some("found.txt"));
        assert_eq!(defaults.timeout.as_deref(), Some("3s"));
        assert_eq!(defaults.delimiter, Some(';'));
    }

    #[test]
    fn test_invalid_concurrency() {
        let temp_file = config_file("[defaults]\nconcurrency = 0\n");
        let manager = ConfigManager::new(false);
        assert!(manager.load_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_invalid_timeout() {
        let temp_file = config_file("[defaults]\ntimeout = \"soon\"\n");
        let manager = ConfigManager::new(false);
        assert!(matches!(
            manager.load_file(temp_file.path()),
            Err(SiteSearchError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_malformed_toml() {
        let temp_file = config_file("[defaults\nconcurrency = 5\n");
        let manager = ConfigManager::new(false);
        assert!(manager.load_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let manager = ConfigManager::new(false);
        assert!(matches!(
            manager.load_file("/nonexistent/site-search.toml"),
            Err(SiteSearchError::FileError { .. })
        ));
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new(false);

        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(10),
                search_term: Some("old".to_string()),
                ..Default::default()
            }),
        };

        let higher = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(25),
                output: Some("new.txt".to_string()),
                ..Default::default()
            }),
        };

        let merged = manager.merge_configs(lower, higher);
        let defaults = merged.defaults.unwrap();

        assert_eq!(defaults.concurrency, Some(25)); // Higher wins
        assert_eq!(defaults.search_term.as_deref(), Some("old")); // Lower preserved
        assert_eq!(defaults.output.as_deref(), Some("new.txt"));
    }

    #[test]
    fn test_merge_with_empty_side() {
        let manager = ConfigManager::new(false);
        let only = FileConfig {
            defaults: Some(DefaultsConfig {
                input: Some("a.csv".to_string()),
                ..Default::default()
            }),
        };

        let merged = manager.merge_configs(only.clone(), FileConfig::default());
        assert_eq!(merged, only);
        let merged = manager.merge_configs(FileConfig::default(), only.clone());
        assert_eq!(merged, only);
    }

    #[test]
    fn test_env_config_parsing() {
        let vars: HashMap<&str, &str> = [
            ("SS_TERM", "needle"),
            ("SS_CONCURRENCY", "7"),
            ("SS_INPUT", "in.csv"),
            ("SS_OUTPUT", ""),
            ("SS_TIMEOUT", "1m"),
        ]
        .into_iter()
        .collect();

        let env_config = load_env_config_from(false, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(env_config.search_term.as_deref(), Some("needle"));
        assert_eq!(env_config.concurrency, Some(7));
        assert_eq!(env_config.input.as_deref(), Some("in.csv"));
        assert_eq!(env_config.output, None);
        assert_eq!(env_config.timeout, Some(Duration::from_secs(60)));
        assert_eq!(env_config.config, None);
    }

    #[test]
    fn test_env_config_ignores_invalid_values() {
        let env_config = load_env_config_from(false, |key| match key {
            "SS_CONCURRENCY" => Some("0".to_string()),
            "SS_TIMEOUT" => Some("later".to_string()),
            _ => None,
        });
        assert_eq!(env_config, EnvConfig::default());
    }
}
