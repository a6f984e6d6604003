//! Output formats for aligned matrices.
//!
//! Absent values stay absent until this layer: CSV writes an empty field,
//! JSON writes `null`, and the HTML report shows `-`.

pub mod csv;
pub mod html;
pub mod json;

use thiserror::Error;

pub use self::csv::{write_metric_csv, write_series_csv};
pub use self::html::render_report;
pub use self::json::TrendReport;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
