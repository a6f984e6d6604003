pub mod completions;
pub mod export;
pub mod generate;
pub mod parse_jmeter;
pub mod parse_wpt;
pub mod runs;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use thiserror::Error;

use ptrend_core::error::AlignmentError;
use ptrend_core::ingest::WptStatistic;
use ptrend_core::{RunStore, TestType};

use crate::config::Config;

/// Argument problems found after clap has parsed the command line.
#[derive(Error, Debug)]
pub enum UsageError {
    #[error("Delimiter should be exactly one character, got '{0}'")]
    Delimiter(String),

    #[error("Ignore pattern '{pattern}' is not a valid regex: {source}")]
    IgnorePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown metric '{0}'. Valid metrics: average, median, perc90, perc95, min, max")]
    Metric(String),

    #[error("Input path is a directory: {}", .0.display())]
    InputIsDirectory(PathBuf),

    #[error("Output path is invalid, expected an existing directory: {}", .0.display())]
    OutputDirectory(PathBuf),

    #[error("Output file path is a directory: {}", .0.display())]
    OutputIsDirectory(PathBuf),
}

/// A file the command needs does not exist.
#[derive(Error, Debug)]
#[error("{kind} does not exist: {}", .path.display())]
pub struct MissingFile {
    pub kind: &'static str,
    pub path: PathBuf,
}

/// Database location shared by every data command
#[derive(Args, Clone, Debug, Default)]
pub struct DbArgs {
    /// Path to the trends database
    #[arg(long = "db", value_name = "PATH", env = "PTREND_DB")]
    pub db: Option<PathBuf>,
}

impl DbArgs {
    pub fn resolve(&self, config: &Config) -> PathBuf {
        config.database(self.db.clone())
    }
}

/// Which kind of runs a command works on
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Source {
    /// JMeter load tests
    #[default]
    Jmeter,
    /// WebPageTest page tests
    Wpt,
}

impl From<Source> for TestType {
    fn from(source: Source) -> Self {
        match source {
            Source::Jmeter => TestType::Jmeter,
            Source::Wpt => TestType::Wpt,
        }
    }
}

/// WebPageTest aggregate to read
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum StatisticArg {
    /// Average over all test repetitions
    #[default]
    Avg,
    /// Standard deviation
    Std,
    /// Median repetition
    Med,
}

impl From<StatisticArg> for WptStatistic {
    fn from(arg: StatisticArg) -> Self {
        match arg {
            StatisticArg::Avg => WptStatistic::Average,
            StatisticArg::Std => WptStatistic::StandardDeviation,
            StatisticArg::Med => WptStatistic::Median,
        }
    }
}

/// Turn a delimiter string into the single byte the CSV layer needs.
pub fn parse_delimiter(value: &str) -> Result<u8, UsageError> {
    match value.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(UsageError::Delimiter(value.to_owned())),
    }
}

/// An input file must exist and must not be a directory.
pub fn check_input_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(MissingFile {
            kind: "Input file",
            path: path.to_path_buf(),
        }
        .into());
    }
    if path.is_dir() {
        return Err(UsageError::InputIsDirectory(path.to_path_buf()).into());
    }
    Ok(())
}

/// Open a database that must already exist.
pub fn open_existing_store(path: &Path) -> Result<RunStore> {
    if !path.is_file() {
        return Err(MissingFile {
            kind: "Database",
            path: path.to_path_buf(),
        }
        .into());
    }
    RunStore::open(path).with_context(|| format!("Failed to open database: {}", path.display()))
}

/// Open a database for writing, creating it when needed.
pub fn open_store(path: &Path) -> Result<RunStore> {
    RunStore::open(path).with_context(|| format!("Failed to open database: {}", path.display()))
}

/// Canonical run order for one test type.
pub fn run_descriptions(store: &RunStore, test_type: TestType) -> Result<Vec<String>> {
    Ok(store
        .runs(test_type)?
        .into_iter()
        .map(|run| run.description)
        .collect())
}

/// Log every label that could not be aligned; fail if there was any.
///
/// Called after the output has been written, so the aligned labels are
/// still delivered.
pub fn check_alignment(failures: Vec<AlignmentError>) -> Result<()> {
    for failure in &failures {
        tracing::warn!(label = failure.label(), "{failure}");
    }
    let count = failures.len();
    match failures.into_iter().next() {
        None => Ok(()),
        Some(first) => Err(anyhow::Error::new(first)
            .context(format!("{count} request(s) were left out of the output"))),
    }
}
