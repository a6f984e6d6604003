//! Configuration file support for the ptrend CLI.
//!
//! Configuration is read from `$PTREND_CONFIG` when set, otherwise from
//! `~/.config/ptrend/config.toml` (XDG) or
//! `~/Library/Application Support/ptrend/config.toml` on macOS.
//!
//! # Example configuration
//!
//! ```toml
//! [defaults]
//! database = "/srv/perf/trends.db"
//! delimiter = ";"
//! ignore_pattern = "^(TC |OPTIONS )"
//! metric = "perc90"
//! verbosity = 1
//! ```
//!
//! Command-line flags always win over these values.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV: &str = "PTREND_CONFIG";

/// Database used when neither the flag, `PTREND_DB` nor the config name one.
pub const DEFAULT_DATABASE: &str = "trends.db";

/// Main configuration structure
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Default settings applied to all commands
    #[serde(default)]
    pub defaults: Defaults,
}

/// Default settings
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// Trends database path
    pub database: Option<PathBuf>,

    /// CSV delimiter for both JMeter input and export output
    pub delimiter: Option<String>,

    /// Labels matching this regex are skipped while parsing JMeter logs
    pub ignore_pattern: Option<String>,

    /// Metric exported when `--metric` is not given
    pub metric: Option<String>,

    /// Default verbosity level (0-3)
    pub verbosity: Option<u8>,
}

impl Config {
    /// Load configuration from the default path, or return empty config if not found.
    pub fn load() -> Result<Self> {
        let Some(path) = config_path() else {
            return Ok(Config::default());
        };

        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Database path: flag (or `PTREND_DB`), then config, then the built-in name.
    pub fn database(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.defaults.database.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }

    /// Delimiter string: flag, then config, then a comma.
    pub fn delimiter(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.defaults.delimiter.clone())
            .unwrap_or_else(|| ",".to_string())
    }

    pub fn ignore_pattern(&self, flag: Option<String>) -> Option<String> {
        flag.or_else(|| self.defaults.ignore_pattern.clone())
    }

    /// Metric name: flag, then config, then `average`.
    pub fn metric(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.defaults.metric.clone())
            .unwrap_or_else(|| "average".to_string())
    }

    /// Effective `-v` count when the flag was not given.
    pub fn verbosity(&self, flag: u8) -> u8 {
        if flag > 0 {
            flag
        } else {
            self.defaults.verbosity.unwrap_or(0)
        }
    }
}

/// Get the path to the configuration file.
///
/// Returns `None` when no home directory can be determined and
/// `PTREND_CONFIG` is unset.
pub fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(explicit));
    }

    let base_dirs = directories::BaseDirs::new()?;

    #[cfg(target_os = "macos")]
    {
        Some(
            base_dirs
                .home_dir()
                .join("Library/Application Support/ptrend/config.toml"),
        )
    }

    #[cfg(not(target_os = "macos"))]
    {
        Some(base_dirs.config_dir().join("ptrend").join("config.toml"))
    }
}
