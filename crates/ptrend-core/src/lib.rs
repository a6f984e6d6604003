//! Performance trend statistics.
//!
//! Latency samples from load-test logs are reduced to per-request summary
//! statistics ([`stats`]), stored per test run ([`store`]), and aligned
//! across runs into a dense request × run matrix ([`align`]) that the
//! [`render`] module turns into CSV, JSON or HTML.

pub mod align;
pub mod error;
pub mod ingest;
pub mod render;
pub mod stats;
pub mod store;

pub use align::{align, align_series, AlignedMatrix, AlignedRow, Alignment, ObservedSeries, RunValue};
pub use stats::{aggregate, Metric, StatisticRecord};
pub use store::{Run, RunStore, TestType};
