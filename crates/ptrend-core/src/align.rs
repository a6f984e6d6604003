//! Cross-run alignment of per-request statistics.
//!
//! Storage hands back, for every request label, only the runs that actually
//! recorded that label: two parallel lists holding run descriptions and
//! values, both in ascending run order. Comparing a label across runs needs a
//! dense vector with one slot per known run instead. This module rebuilds
//! that vector, marking runs without data as [`RunValue::Absent`].
//!
//! Placement is a keyed lookup against the canonical run list, so a missing
//! run never shifts the values of the runs that follow it.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::stats::{Metric, StatisticRecord};

/// Errors raised while aligning a single label.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    /// The label's runs do not embed into the canonical run order: a run is
    /// unknown, repeated, or out of order.
    #[error("Request '{label}' references run '{run}' inconsistently with the known run order")]
    InconsistentRunOrder { label: String, run: String },

    #[error("Request '{label}' has {runs} run descriptions but {values} values")]
    LengthMismatch {
        label: String,
        runs: usize,
        values: usize,
    },
}

impl AlignmentError {
    /// Label the error belongs to.
    pub fn label(&self) -> &str {
        match self {
            AlignmentError::InconsistentRunOrder { label, .. }
            | AlignmentError::LengthMismatch { label, .. } => label,
        }
    }
}

/// The value of one label in one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RunValue<T> {
    /// The run recorded this label.
    Recorded(T),
    /// The run has no data for this label.
    Absent,
}

impl<T> RunValue<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, RunValue::Absent)
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            RunValue::Recorded(v) => Some(v),
            RunValue::Absent => None,
        }
    }

    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> RunValue<U> {
        match self {
            RunValue::Recorded(v) => RunValue::Recorded(f(v)),
            RunValue::Absent => RunValue::Absent,
        }
    }
}

/// Runs that recorded a label, as delivered by storage.
///
/// `runs` and `values` are parallel and ordered by ascending run.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedSeries<T> {
    pub label: String,
    pub runs: Vec<String>,
    pub values: Vec<T>,
}

impl<T> ObservedSeries<T> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            runs: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Append the value recorded by `run`.
    pub fn push(&mut self, run: impl Into<String>, value: T) {
        self.runs.push(run.into());
        self.values.push(value);
    }
}

/// One request label with a slot for every known run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedRow<T> {
    pub label: String,
    pub per_run: Vec<RunValue<T>>,
}

/// Dense label × run matrix.
///
/// Every row holds exactly `run_descriptions.len()` entries, in canonical
/// run order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedMatrix<T> {
    pub run_descriptions: Vec<String>,
    pub rows: Vec<AlignedRow<T>>,
}

impl<T> AlignedMatrix<T> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, label: &str) -> Option<&AlignedRow<T>> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Order rows lexicographically by label.
    pub fn sort_rows(&mut self) {
        self.rows.sort_by(|a, b| a.label.cmp(&b.label));
    }
}

impl AlignedMatrix<StatisticRecord> {
    /// Project every row onto a single metric.
    pub fn metric_rows(&self, metric: Metric) -> Vec<(&str, Vec<Option<f64>>)> {
        self.rows
            .iter()
            .map(|row| {
                let values = row
                    .per_run
                    .iter()
                    .map(|v| v.as_option().map(|r| r.value(metric)))
                    .collect();
                (row.label.as_str(), values)
            })
            .collect()
    }
}

/// Result of aligning many labels at once.
#[derive(Debug, Clone)]
pub struct Alignment<T> {
    /// Rows for every label that aligned cleanly.
    pub matrix: AlignedMatrix<T>,
    /// Labels that were abandoned, with the reason.
    pub failures: Vec<AlignmentError>,
}

/// Canonical run positions, built once per alignment.
struct RunIndex<'a> {
    len: usize,
    positions: HashMap<&'a str, usize>,
}

impl<'a> RunIndex<'a> {
    fn new(canonical: &'a [String]) -> Self {
        let mut positions = HashMap::with_capacity(canonical.len());
        for (i, desc) in canonical.iter().enumerate() {
            // duplicate descriptions: first occurrence wins
            positions.entry(desc.as_str()).or_insert(i);
        }
        Self {
            len: canonical.len(),
            positions,
        }
    }

    fn align<T>(&self, series: ObservedSeries<T>) -> Result<AlignedRow<T>, AlignmentError> {
        let ObservedSeries {
            label,
            runs,
            values,
        } = series;

        if runs.len() != values.len() {
            return Err(AlignmentError::LengthMismatch {
                label,
                runs: runs.len(),
                values: values.len(),
            });
        }

        let mut per_run: Vec<RunValue<T>> = (0..self.len).map(|_| RunValue::Absent).collect();
        let mut previous: Option<usize> = None;

        for (run, value) in runs.into_iter().zip(values) {
            let position = match self.positions.get(run.as_str()) {
                Some(&p) if previous.is_none_or(|prev| p > prev) => p,
                _ => return Err(AlignmentError::InconsistentRunOrder { label, run }),
            };
            per_run[position] = RunValue::Recorded(value);
            previous = Some(position);
        }

        Ok(AlignedRow { label, per_run })
    }
}

/// Align one label against the canonical run order.
pub fn align_series<T>(
    canonical: &[String],
    series: ObservedSeries<T>,
) -> Result<AlignedRow<T>, AlignmentError> {
    RunIndex::new(canonical).align(series)
}

/// Align every label against the canonical run order.
///
/// Labels are independent and aligned in parallel. Rows come back in input
/// order; a label that fails is reported in [`Alignment::failures`] and the
/// rest still align.
pub fn align<T, I>(canonical: &[String], series: I) -> Alignment<T>
where
    T: Send,
    I: IntoIterator<Item = ObservedSeries<T>>,
{
    let index = RunIndex::new(canonical);
    let series: Vec<_> = series.into_iter().collect();

    let results: Vec<_> = series
        .into_par_iter()
        .map(|s| index.align(s))
        .collect();

    let mut rows = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!(label = e.label(), "Skipping request: {e}");
                failures.push(e);
            }
        }
    }

    tracing::debug!(
        runs = canonical.len(),
        rows = rows.len(),
        failures = failures.len(),
        "Aligned requests across runs"
    );

    Alignment {
        matrix: AlignedMatrix {
            run_descriptions: canonical.to_vec(),
            rows,
        },
        failures,
    }
}
