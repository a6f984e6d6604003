//! Build the HTML (or JSON) trend report from stored runs.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use ptrend_core::error::AlignmentError;
use ptrend_core::ingest::WptStatistic;
use ptrend_core::render::{render_report, TrendReport};
use ptrend_core::{align, RunStore, TestType};

use super::{check_alignment, open_existing_store, run_descriptions, DbArgs, Source, UsageError};
use crate::config::Config;

/// File written for the HTML page
pub const HTML_FILE: &str = "index.html";

/// File written with `--json`
pub const JSON_FILE: &str = "report.json";

#[derive(ClapArgs, Clone, Debug)]
pub struct Args {
    #[command(flatten)]
    pub db: DbArgs,

    /// Kind of runs to report on
    #[arg(short, long, value_enum, default_value_t = Source::Jmeter)]
    pub source: Source,

    /// Existing directory to write the report into
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Write the report data as JSON instead of an HTML page
    #[arg(long)]
    pub json: bool,
}

#[instrument(level = "info", name = "cmd::generate", skip_all)]
pub fn execute(args: &Args, config: &Config) -> Result<()> {
    if !args.output.is_dir() {
        return Err(UsageError::OutputDirectory(args.output.clone()).into());
    }

    let store = open_existing_store(&args.db.resolve(config))?;
    let (report, failures) = match args.source {
        Source::Jmeter => request_report(&store)?,
        Source::Wpt => wpt_report(&store)?,
    };

    tracing::info!(
        runs = report.tests.len(),
        labels = report.results.len(),
        "Built trend report"
    );

    let path = if args.json {
        write_json(&report, &args.output)?
    } else {
        write_html(&report, args.source, &args.output)?
    };

    println!("Report written to {}", path.display());
    check_alignment(failures)
}

fn request_report(store: &RunStore) -> Result<(TrendReport, Vec<AlignmentError>)> {
    let runs = run_descriptions(store, TestType::Jmeter)?;
    let alignment = align(&runs, store.request_series(TestType::Jmeter)?);
    Ok((TrendReport::from_requests(&alignment.matrix), alignment.failures))
}

fn wpt_report(store: &RunStore) -> Result<(TrendReport, Vec<AlignmentError>)> {
    let runs = run_descriptions(store, TestType::Wpt)?;
    let mut matrices = Vec::with_capacity(WptStatistic::ALL.len());
    let mut failures = Vec::new();

    for statistic in WptStatistic::ALL {
        let alignment = align(&runs, store.wpt_series(statistic)?);
        failures.extend(alignment.failures);
        matrices.push((statistic, alignment.matrix));
    }

    Ok((TrendReport::from_wpt(runs, &matrices), failures))
}

fn write_json(report: &TrendReport, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(JSON_FILE);
    let file = File::create(&path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    report.write_pretty(BufWriter::new(file))?;
    Ok(path)
}

fn write_html(report: &TrendReport, source: Source, dir: &Path) -> Result<PathBuf> {
    let title = match source {
        Source::Jmeter => "JMeter performance trends",
        Source::Wpt => "WebPageTest performance trends",
    };
    let page = render_report(report, title)?;

    let path = dir.join(HTML_FILE);
    std::fs::write(&path, page)
        .with_context(|| format!("Failed to write report file: {}", path.display()))?;
    Ok(path)
}
