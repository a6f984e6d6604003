//! Parse JMeter logs of one test run and store their request statistics.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use regex::Regex;
use tracing::instrument;

use ptrend_core::ingest::{JmeterOptions, JmeterReader, SampleCollector};

use super::{check_input_file, open_store, parse_delimiter, DbArgs, UsageError};
use crate::config::Config;

#[derive(ClapArgs, Clone, Debug)]
pub struct Args {
    /// Unique description of the test run (commas are removed)
    pub description: String,

    /// JMeter CSV logs belonging to this run
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub db: DbArgs,

    /// Single character used as field delimiter
    #[arg(short, long)]
    pub delimiter: Option<String>,

    /// Input files start with a header line of field names
    #[arg(short = 'f', long = "field-names")]
    pub field_names: bool,

    /// Labels matching this regex are ignored
    #[arg(short, long, value_name = "PATTERN")]
    pub ignore_pattern: Option<String>,
}

#[instrument(level = "info", name = "cmd::parse_jmeter", skip_all, fields(run = %args.description))]
pub fn execute(args: &Args, config: &Config) -> Result<()> {
    let delimiter = parse_delimiter(&config.delimiter(args.delimiter.clone()))?;
    let ignore_pattern = config
        .ignore_pattern(args.ignore_pattern.clone())
        .map(|pattern| {
            Regex::new(&pattern).map_err(|source| UsageError::IgnorePattern { pattern, source })
        })
        .transpose()?;

    for input in &args.inputs {
        check_input_file(input)?;
    }

    let reader = JmeterReader::new(JmeterOptions {
        delimiter,
        has_header: args.field_names,
        ignore_pattern,
    });

    let mut collector = SampleCollector::new();
    let summary = reader
        .read_paths(&args.inputs, &mut collector)
        .context("Failed to parse JMeter log")?;

    if summary.malformed > 0 {
        tracing::warn!(
            malformed = summary.malformed,
            "Skipped samples with unparseable durations"
        );
    }
    let samples = collector.sample_count();
    let records = collector.into_records();
    if records.is_empty() {
        tracing::warn!("No requests left after filtering; storing an empty run");
    }

    let db_path = args.db.resolve(config);
    let mut store = open_store(&db_path)?;
    let run = store
        .record_run(&args.description, &records)
        .with_context(|| format!("Failed to store run '{}'", args.description))?;

    tracing::info!(
        rows = summary.rows,
        ignored = summary.ignored,
        "Parsed {} file(s)",
        args.inputs.len()
    );
    println!(
        "Stored run '{}': {} requests from {} samples",
        run.description,
        records.len(),
        samples
    );
    Ok(())
}
