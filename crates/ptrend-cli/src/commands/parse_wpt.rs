//! Store one WebPageTest JSON result as a run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use ptrend_core::ingest::WptReport;

use super::{check_input_file, open_store, DbArgs};
use crate::config::Config;

#[derive(ClapArgs, Clone, Debug)]
pub struct Args {
    /// WebPageTest result JSON
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[command(flatten)]
    pub db: DbArgs,
}

#[instrument(level = "info", name = "cmd::parse_wpt", skip_all)]
pub fn execute(args: &Args, config: &Config) -> Result<()> {
    check_input_file(&args.input)?;

    let report = WptReport::from_path(&args.input)
        .with_context(|| format!("Failed to read WebPageTest result: {}", args.input.display()))?;

    let db_path = args.db.resolve(config);
    let mut store = open_store(&db_path)?;
    let run = store
        .record_wpt_run(&report)
        .with_context(|| format!("Failed to store run '{}'", report.description()))?;

    println!("Stored run '{}'", run.description);
    Ok(())
}
