//! Decoding of raw test output into per-request samples.
//!
//! - [`jmeter`] reads CSV transaction logs into a [`SampleCollector`]
//! - [`wpt`] reads WebPageTest JSON result files

pub mod jmeter;
pub mod wpt;

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::stats::{aggregate, StatisticRecord, StatsError};

pub use jmeter::{JmeterOptions, JmeterReader};
pub use wpt::{WptMetrics, WptReport, WptStatistic};

/// Errors produced while decoding input files.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A duration field is not a non-negative integer.
    #[error("Malformed sample on line {line}: '{value}' is not a duration")]
    MalformedSample { line: u64, value: String },

    #[error("Line {line} has {found} columns, expected at least {expected}")]
    MissingColumn {
        line: u64,
        found: usize,
        expected: usize,
    },

    #[error("WebPageTest result is missing '{0}'")]
    MissingField(&'static str),
}

/// Samples grouped by request label for a single ingestion call.
///
/// Create one per run, feed it every input file, then turn it into
/// statistic records.
#[derive(Debug, Default)]
pub struct SampleCollector {
    samples: BTreeMap<String, Vec<u64>>,
}

impl SampleCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sample for `label`.
    pub fn push(&mut self, label: &str, duration: u64) {
        match self.samples.get_mut(label) {
            Some(values) => values.push(duration),
            None => {
                self.samples.insert(label.to_owned(), vec![duration]);
            }
        }
    }

    /// Distinct labels seen so far, in lexicographic order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(String::as_str)
    }

    /// Samples recorded for `label`.
    pub fn samples(&self, label: &str) -> Option<&[u64]> {
        self.samples.get(label).map(Vec::as_slice)
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total number of samples across all labels.
    pub fn sample_count(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    /// Aggregate every label.
    ///
    /// Labels without samples are logged and skipped; they never abort the
    /// batch.
    pub fn into_records(self) -> Vec<StatisticRecord> {
        self.samples
            .into_iter()
            .filter_map(|(label, values)| match aggregate(&label, &values) {
                Ok(record) => Some(record),
                Err(e @ StatsError::EmptySampleSet { .. }) => {
                    tracing::warn!("Skipping request: {e}");
                    None
                }
                Err(e) => {
                    tracing::error!("Failed to aggregate '{label}': {e}");
                    None
                }
            })
            .collect()
    }
}
