//! JSON trend report, also the data payload of the HTML page.

use std::collections::BTreeMap;
use std::io;

use serde::Serialize;

use super::RenderError;
use crate::align::AlignedMatrix;
use crate::ingest::WptStatistic;
use crate::stats::{round2, Metric, StatisticRecord};

/// Values of every metric for every label, one entry per run.
///
/// ```json
/// {
///   "tests": ["run 1", "run 2"],
///   "metrics": ["average", "median"],
///   "results": { "login": { "average": [120.5, null] } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendReport {
    pub tests: Vec<String>,
    pub metrics: Vec<String>,
    pub results: BTreeMap<String, BTreeMap<String, Vec<Option<f64>>>>,
}

impl TrendReport {
    pub fn new(tests: Vec<String>) -> Self {
        Self {
            tests,
            ..Self::default()
        }
    }

    /// Add one metric vector for `label`. Values are rounded to two decimals.
    pub fn insert(&mut self, label: &str, metric: &str, values: Vec<Option<f64>>) {
        if !self.metrics.iter().any(|m| m == metric) {
            self.metrics.push(metric.to_owned());
        }
        let values = values.into_iter().map(|v| v.map(round2)).collect();
        self.results
            .entry(label.to_owned())
            .or_default()
            .insert(metric.to_owned(), values);
    }

    /// Report over all six request metrics.
    pub fn from_requests(matrix: &AlignedMatrix<StatisticRecord>) -> Self {
        let mut report = Self::new(matrix.run_descriptions.clone());
        for metric in Metric::ALL {
            for (label, values) in matrix.metric_rows(metric) {
                report.insert(label, metric.as_str(), values);
            }
        }
        report
    }

    /// Report over WebPageTest aggregates, one matrix per aggregate.
    pub fn from_wpt(tests: Vec<String>, matrices: &[(WptStatistic, AlignedMatrix<f64>)]) -> Self {
        let mut report = Self::new(tests);
        for (statistic, matrix) in matrices {
            for row in &matrix.rows {
                let values = row.per_run.iter().map(|v| v.as_option().copied()).collect();
                report.insert(&row.label, statistic.as_str(), values);
            }
        }
        report
    }

    pub fn to_json(&self) -> Result<String, RenderError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn write_pretty<W: io::Write>(&self, writer: W) -> Result<(), RenderError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
