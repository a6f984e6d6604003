//! Export one metric of every stored run as a request × run CSV table.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use ptrend_core::error::AlignmentError;
use ptrend_core::ingest::WptStatistic;
use ptrend_core::render::{write_metric_csv, write_series_csv};
use ptrend_core::{align, Metric, RunStore, TestType};

use super::{
    check_alignment, open_existing_store, parse_delimiter, run_descriptions, DbArgs, Source,
    StatisticArg, UsageError,
};
use crate::config::Config;

#[derive(ClapArgs, Clone, Debug)]
pub struct Args {
    #[command(flatten)]
    pub db: DbArgs,

    /// Kind of runs to export
    #[arg(short, long, value_enum, default_value_t = Source::Jmeter)]
    pub source: Source,

    /// Request metric to export: average, median, perc90, perc95, min, max
    #[arg(short, long)]
    pub metric: Option<String>,

    /// WebPageTest aggregate to export
    #[arg(short = 'k', long = "kind", value_enum, default_value_t = StatisticArg::Avg)]
    pub statistic: StatisticArg,

    /// Single character used as field delimiter
    #[arg(short, long)]
    pub delimiter: Option<String>,

    /// Export file name
    #[arg(short = 'n', long = "name", default_value = "export.csv")]
    pub name: PathBuf,
}

#[instrument(level = "info", name = "cmd::export", skip_all)]
pub fn execute(args: &Args, config: &Config) -> Result<()> {
    let delimiter = parse_delimiter(&config.delimiter(args.delimiter.clone()))?;
    let metric_name = config.metric(args.metric.clone());
    let metric: Metric = metric_name
        .parse()
        .map_err(|_| UsageError::Metric(metric_name.clone()))?;

    if args.name.is_dir() {
        return Err(UsageError::OutputIsDirectory(args.name.clone()).into());
    }

    let store = open_existing_store(&args.db.resolve(config))?;

    let file = File::create(&args.name)
        .with_context(|| format!("Failed to create export file: {}", args.name.display()))?;
    let mut writer = BufWriter::new(file);

    let failures = match args.source {
        Source::Jmeter => export_requests(&store, metric, delimiter, &mut writer)?,
        Source::Wpt => export_wpt(&store, args.statistic.into(), delimiter, &mut writer)?,
    };
    writer.flush()?;

    println!("Exported to {}", args.name.display());
    check_alignment(failures)
}

fn export_requests<W: Write>(
    store: &RunStore,
    metric: Metric,
    delimiter: u8,
    writer: W,
) -> Result<Vec<AlignmentError>> {
    let runs = run_descriptions(store, TestType::Jmeter)?;
    let alignment = align(&runs, store.request_series(TestType::Jmeter)?);

    tracing::info!(
        runs = runs.len(),
        requests = alignment.matrix.len(),
        %metric,
        "Exporting request statistics"
    );
    write_metric_csv(writer, &alignment.matrix, metric, delimiter)?;
    Ok(alignment.failures)
}

fn export_wpt<W: Write>(
    store: &RunStore,
    statistic: WptStatistic,
    delimiter: u8,
    writer: W,
) -> Result<Vec<AlignmentError>> {
    let runs = run_descriptions(store, TestType::Wpt)?;
    let alignment = align(&runs, store.wpt_series(statistic)?);

    tracing::info!(runs = runs.len(), %statistic, "Exporting WebPageTest metrics");
    write_series_csv(writer, &alignment.matrix, delimiter)?;
    Ok(alignment.failures)
}
