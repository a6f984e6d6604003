//! WebPageTest result decoding.
//!
//! A result file carries aggregate first-view metrics under
//! `data.average`, `data.standardDeviation` and `data.median`. Each of the
//! three sets becomes one stored row for the run.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use super::IngestError;

/// Which aggregate a metric set holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WptStatistic {
    Average,
    StandardDeviation,
    Median,
}

impl WptStatistic {
    pub const ALL: [WptStatistic; 3] = [
        WptStatistic::Average,
        WptStatistic::StandardDeviation,
        WptStatistic::Median,
    ];

    /// Short code stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            WptStatistic::Average => "avg",
            WptStatistic::StandardDeviation => "std",
            WptStatistic::Median => "med",
        }
    }
}

impl fmt::Display for WptStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WptStatistic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avg" => Ok(WptStatistic::Average),
            "std" => Ok(WptStatistic::StandardDeviation),
            "med" => Ok(WptStatistic::Median),
            other => Err(format!("unknown WebPageTest statistic: {other}")),
        }
    }
}

/// Database column and WebPageTest key of every tracked metric, in storage
/// order.
pub const WPT_FIELDS: [(&str, &str); 26] = [
    ("responses_200", "responses_200"),
    ("bytes_out", "bytesOut"),
    ("gzip_savings", "gzip_savings"),
    ("requests_full", "requestsFull"),
    ("connections", "connections"),
    ("bytes_out_doc", "bytesOutDoc"),
    ("result", "result"),
    ("base_page_ssl_time", "basePageSSLTime"),
    ("doc_time", "docTime"),
    ("dom_content_loaded_event_end", "domContentLoadedEventEnd"),
    ("image_savings", "image_savings"),
    ("requests_doc", "requestsDoc"),
    ("first_text_paint", "firstTextPaint"),
    ("first_paint", "firstPaint"),
    ("score_cdn", "score_cdn"),
    ("cpu_idle", "cpu.Idle"),
    ("optimization_checked", "optimization_checked"),
    ("image_total", "image_total"),
    ("score_minify", "score_minify"),
    ("gzip_total", "gzip_total"),
    ("responses_404", "responses_404"),
    ("load_time", "loadTime"),
    ("score_combine", "score_combine"),
    ("first_contentful_paint", "firstContentfulPaint"),
    ("first_layout", "firstLayout"),
    ("score_etags", "score_etags"),
];

/// First-view metrics of one aggregate. Missing keys read as zero.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WptMetrics {
    pub responses_200: f64,
    #[serde(rename = "bytesOut")]
    pub bytes_out: f64,
    pub gzip_savings: f64,
    #[serde(rename = "requestsFull")]
    pub requests_full: f64,
    pub connections: f64,
    #[serde(rename = "bytesOutDoc")]
    pub bytes_out_doc: f64,
    pub result: f64,
    #[serde(rename = "basePageSSLTime")]
    pub base_page_ssl_time: f64,
    #[serde(rename = "docTime")]
    pub doc_time: f64,
    #[serde(rename = "domContentLoadedEventEnd")]
    pub dom_content_loaded_event_end: f64,
    pub image_savings: f64,
    #[serde(rename = "requestsDoc")]
    pub requests_doc: f64,
    #[serde(rename = "firstTextPaint")]
    pub first_text_paint: f64,
    #[serde(rename = "firstPaint")]
    pub first_paint: f64,
    pub score_cdn: f64,
    #[serde(rename = "cpu.Idle")]
    pub cpu_idle: f64,
    pub optimization_checked: f64,
    pub image_total: f64,
    pub score_minify: f64,
    pub gzip_total: f64,
    pub responses_404: f64,
    #[serde(rename = "loadTime")]
    pub load_time: f64,
    pub score_combine: f64,
    #[serde(rename = "firstContentfulPaint")]
    pub first_contentful_paint: f64,
    #[serde(rename = "firstLayout")]
    pub first_layout: f64,
    pub score_etags: f64,
}

impl WptMetrics {
    /// Values in [`WPT_FIELDS`] order.
    pub fn values(&self) -> [f64; 26] {
        [
            self.responses_200,
            self.bytes_out,
            self.gzip_savings,
            self.requests_full,
            self.connections,
            self.bytes_out_doc,
            self.result,
            self.base_page_ssl_time,
            self.doc_time,
            self.dom_content_loaded_event_end,
            self.image_savings,
            self.requests_doc,
            self.first_text_paint,
            self.first_paint,
            self.score_cdn,
            self.cpu_idle,
            self.optimization_checked,
            self.image_total,
            self.score_minify,
            self.gzip_total,
            self.responses_404,
            self.load_time,
            self.score_combine,
            self.first_contentful_paint,
            self.first_layout,
            self.score_etags,
        ]
    }
}

#[derive(Deserialize)]
struct Envelope {
    data: Option<ResultData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultData {
    id: Option<String>,
    location: Option<String>,
    average: Option<Views>,
    standard_deviation: Option<Views>,
    median: Option<Views>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Views {
    first_view: Option<WptMetrics>,
}

/// A decoded WebPageTest result.
#[derive(Debug, Clone, PartialEq)]
pub struct WptReport {
    pub id: String,
    pub location: String,
    pub average: WptMetrics,
    pub standard_deviation: WptMetrics,
    pub median: WptMetrics,
}

impl WptReport {
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let file = File::open(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, IngestError> {
        let envelope: Envelope = serde_json::from_reader(reader)?;
        let data = envelope.data.ok_or(IngestError::MissingField("data"))?;

        Ok(Self {
            id: data.id.ok_or(IngestError::MissingField("data.id"))?,
            location: data
                .location
                .ok_or(IngestError::MissingField("data.location"))?,
            average: first_view(data.average, "data.average.firstView")?,
            standard_deviation: first_view(
                data.standard_deviation,
                "data.standardDeviation.firstView",
            )?,
            median: first_view(data.median, "data.median.firstView")?,
        })
    }

    /// Run description: `"<id> (<location>)"`.
    pub fn description(&self) -> String {
        format!("{} ({})", self.id, self.location)
    }

    /// Metric set for one aggregate.
    pub fn metrics(&self, statistic: WptStatistic) -> &WptMetrics {
        match statistic {
            WptStatistic::Average => &self.average,
            WptStatistic::StandardDeviation => &self.standard_deviation,
            WptStatistic::Median => &self.median,
        }
    }
}

fn first_view(views: Option<Views>, field: &'static str) -> Result<WptMetrics, IngestError> {
    views
        .and_then(|v| v.first_view)
        .ok_or(IngestError::MissingField(field))
}
