//! Per-request summary statistics.
//!
//! Every request label recorded in a run is reduced to a [`StatisticRecord`]:
//! sample count, mean, median, 90th and 95th percentile, min and max.
//! Percentiles use linear interpolation between closest ranks (the same
//! method as Excel's `PERCENTILE.INC`), and every fractional value is rounded
//! to two decimal places.

// Durations are integers, statistics are floats. The casts are intentional.
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while computing statistics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// A label reached aggregation without a single retained sample.
    #[error("No samples retained for request '{label}'")]
    EmptySampleSet { label: String },

    #[error("Unknown metric '{0}' (expected one of: average, median, perc90, perc95, min, max)")]
    UnknownMetric(String),
}

/// Summary statistics for one request label within one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticRecord {
    /// Request label (e.g. transaction or endpoint name).
    pub label: String,
    /// Number of samples the statistics were computed from. Always at least 1.
    pub sample_count: usize,
    /// Arithmetic mean, rounded to two decimals.
    pub average: f64,
    /// 50th percentile.
    pub median: f64,
    /// 90th percentile.
    pub perc90: f64,
    /// 95th percentile.
    pub perc95: f64,
    /// Smallest sample.
    pub min: u64,
    /// Largest sample.
    pub max: u64,
}

impl StatisticRecord {
    /// Value of a single metric as a float.
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Average => self.average,
            Metric::Median => self.median,
            Metric::Perc90 => self.perc90,
            Metric::Perc95 => self.perc95,
            Metric::Min => self.min as f64,
            Metric::Max => self.max as f64,
        }
    }
}

/// One of the six tracked statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Average,
    Median,
    Perc90,
    Perc95,
    Min,
    Max,
}

impl Metric {
    /// All metrics in report order.
    pub const ALL: [Metric; 6] = [
        Metric::Average,
        Metric::Median,
        Metric::Perc90,
        Metric::Perc95,
        Metric::Min,
        Metric::Max,
    ];

    /// Name used in storage columns, CLI flags and JSON keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Average => "average",
            Metric::Median => "median",
            Metric::Perc90 => "perc90",
            Metric::Perc95 => "perc95",
            Metric::Min => "min",
            Metric::Max => "max",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| StatsError::UnknownMetric(s.to_owned()))
    }
}

/// Compute the summary statistics for one label.
///
/// Input order is irrelevant; a single sorted copy of `samples` feeds every
/// output. Duplicates are kept.
pub fn aggregate(label: &str, samples: &[u64]) -> Result<StatisticRecord, StatsError> {
    if samples.is_empty() {
        return Err(StatsError::EmptySampleSet {
            label: label.to_owned(),
        });
    }

    let mut sorted = samples.to_vec();
    sorted.sort_unstable();

    let count = sorted.len();
    let sum: u128 = sorted.iter().map(|&v| u128::from(v)).sum();

    Ok(StatisticRecord {
        label: label.to_owned(),
        sample_count: count,
        average: round2(sum as f64 / count as f64),
        median: percentile(&sorted, 50),
        perc90: percentile(&sorted, 90),
        perc95: percentile(&sorted, 95),
        min: sorted[0],
        max: sorted[count - 1],
    })
}

/// Percentile of ascending `sorted` data, interpolated between closest ranks.
///
/// A single sample is returned as-is for every `p`. Returns 0.0 for empty
/// input.
pub fn percentile(sorted: &[u64], p: u8) -> f64 {
    match sorted {
        [] => 0.0,
        [only] => *only as f64,
        _ => {
            let rank = f64::from(p) / 100.0 * (sorted.len() - 1) as f64 + 1.0;
            let ir = rank.floor() as usize;
            let fr = rank - ir as f64;

            let lower = sorted[ir - 1] as f64;
            // rank reaches len only at p = 100
            let upper = sorted[ir.min(sorted.len() - 1)] as f64;

            round2(lower + fr * (upper - lower))
        }
    }
}

/// Round to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_sample() {
        let r = aggregate("L", &[42]).unwrap();
        assert_eq!(r.sample_count, 1);
        assert_eq!(r.average, 42.0);
        assert_eq!(r.median, 42.0);
        assert_eq!(r.perc90, 42.0);
        assert_eq!(r.perc95, 42.0);
        assert_eq!(r.min, 42);
        assert_eq!(r.max, 42);
    }

    #[test]
    fn test_four_samples_interpolation() {
        let r = aggregate("L", &[40, 10, 30, 20]).unwrap();
        assert_eq!(r.median, 25.0);
        assert_eq!(r.perc90, 37.0);
        assert_eq!(r.perc95, 38.5);
        assert_eq!(r.average, 25.0);
        assert_eq!(r.min, 10);
        assert_eq!(r.max, 40);
    }

    #[test]
    fn test_average_rounding() {
        let r = aggregate("L", &[1, 2]).unwrap();
        assert_eq!(r.average, 1.5);

        let r = aggregate("L", &[1, 1, 2]).unwrap();
        assert_eq!(r.average, 1.33);

        let r = aggregate("L", &[1, 2, 2]).unwrap();
        assert_eq!(r.average, 1.67);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let r = aggregate("L", &[5, 5, 5, 100]).unwrap();
        assert_eq!(r.sample_count, 4);
        assert_eq!(r.median, 5.0);
        assert_eq!(r.average, 28.75);
    }

    #[test]
    fn test_empty_sample_set() {
        let err = aggregate("checkout", &[]).unwrap_err();
        assert_eq!(
            err,
            StatsError::EmptySampleSet {
                label: "checkout".to_string()
            }
        );
        assert!(err.to_string().contains("checkout"));
    }

    #[test]
    fn test_percentile_edges() {
        assert_eq!(percentile(&[], 50), 0.0);
        assert_eq!(percentile(&[7], 95), 7.0);
        assert_eq!(percentile(&[1, 2, 3], 0), 1.0);
        assert_eq!(percentile(&[1, 2, 3], 100), 3.0);
        assert_eq!(percentile(&[0, 0], 90), 0.0);
    }

    #[test]
    fn test_two_samples_perc95_below_max() {
        let r = aggregate("L", &[100, 200]).unwrap();
        assert_eq!(r.perc90, 190.0);
        assert_eq!(r.perc95, 195.0);
    }

    #[test]
    fn test_metric_round_trip_names() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
        assert!(matches!(
            "p99".parse::<Metric>(),
            Err(StatsError::UnknownMetric(name)) if name == "p99"
        ));
    }

    #[test]
    fn test_record_value_by_metric() {
        let r = aggregate("L", &[10, 20, 30, 40]).unwrap();
        assert_eq!(r.value(Metric::Average), 25.0);
        assert_eq!(r.value(Metric::Perc90), 37.0);
        assert_eq!(r.value(Metric::Min), 10.0);
        assert_eq!(r.value(Metric::Max), 40.0);
    }
}
