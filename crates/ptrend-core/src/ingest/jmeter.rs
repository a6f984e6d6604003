//! JMeter CSV transaction log decoding.
//!
//! Only two columns matter: column 1 holds the elapsed time and column 2 the
//! request label, matching JMeter's default `timeStamp,elapsed,label,...`
//! layout.

use std::fs::File;
use std::io;
use std::path::Path;

use regex::Regex;

use super::{IngestError, SampleCollector};

const ELAPSED_COLUMN: usize = 1;
const LABEL_COLUMN: usize = 2;

/// How to read a JMeter log.
#[derive(Debug, Clone)]
pub struct JmeterOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Skip the first line as a header.
    pub has_header: bool,
    /// Drop requests whose label matches this pattern.
    pub ignore_pattern: Option<Regex>,
}

impl Default for JmeterOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: false,
            ignore_pattern: None,
        }
    }
}

/// Counters for one decoded log.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadSummary {
    /// Data rows read (header excluded).
    pub rows: u64,
    /// Samples handed to the collector.
    pub accepted: u64,
    /// Rows dropped by the ignore pattern.
    pub ignored: u64,
    /// Rows whose duration did not parse.
    pub malformed: u64,
}

impl ReadSummary {
    fn merge(&mut self, other: ReadSummary) {
        self.rows += other.rows;
        self.accepted += other.accepted;
        self.ignored += other.ignored;
        self.malformed += other.malformed;
    }
}

/// Reads JMeter logs into a [`SampleCollector`].
#[derive(Debug, Clone, Default)]
pub struct JmeterReader {
    options: JmeterOptions,
}

impl JmeterReader {
    pub fn new(options: JmeterOptions) -> Self {
        Self { options }
    }

    /// Read several log files into one collector.
    pub fn read_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        collector: &mut SampleCollector,
    ) -> Result<ReadSummary, IngestError> {
        let mut total = ReadSummary::default();
        for path in paths {
            total.merge(self.read_path(path.as_ref(), collector)?);
        }
        Ok(total)
    }

    /// Read one log file.
    pub fn read_path(
        &self,
        path: &Path,
        collector: &mut SampleCollector,
    ) -> Result<ReadSummary, IngestError> {
        let file = File::open(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let summary = self.read(file, collector)?;
        tracing::debug!(
            path = %path.display(),
            rows = summary.rows,
            accepted = summary.accepted,
            ignored = summary.ignored,
            malformed = summary.malformed,
            "Read JMeter log"
        );
        Ok(summary)
    }

    /// Read a log from any byte source.
    ///
    /// Malformed durations are logged and skipped. Structural problems
    /// (unreadable CSV, rows without a label column) abort the read.
    pub fn read<R: io::Read>(
        &self,
        source: R,
        collector: &mut SampleCollector,
    ) -> Result<ReadSummary, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(self.options.has_header)
            .flexible(true)
            .from_reader(source);

        let mut summary = ReadSummary::default();
        let mut record = csv::StringRecord::new();

        while reader.read_record(&mut record)? {
            summary.rows += 1;
            let line = record.position().map_or(summary.rows, csv::Position::line);

            if record.len() <= LABEL_COLUMN {
                return Err(IngestError::MissingColumn {
                    line,
                    found: record.len(),
                    expected: LABEL_COLUMN + 1,
                });
            }

            let label = &record[LABEL_COLUMN];
            if self
                .options
                .ignore_pattern
                .as_ref()
                .is_some_and(|p| p.is_match(label))
            {
                summary.ignored += 1;
                continue;
            }

            match parse_duration(line, &record[ELAPSED_COLUMN]) {
                Ok(elapsed) => {
                    collector.push(label, elapsed);
                    summary.accepted += 1;
                }
                Err(e) => {
                    tracing::warn!("{e}");
                    summary.malformed += 1;
                }
            }
        }

        Ok(summary)
    }
}

fn parse_duration(line: u64, value: &str) -> Result<u64, IngestError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| IngestError::MalformedSample {
            line,
            value: value.to_owned(),
        })
}
