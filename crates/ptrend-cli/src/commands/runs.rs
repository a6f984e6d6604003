//! List stored runs in canonical order.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use ptrend_core::TestType;

use super::{open_existing_store, DbArgs, Source};
use crate::config::Config;
use crate::output::runs_table;

#[derive(ClapArgs, Clone, Debug)]
pub struct Args {
    #[command(flatten)]
    pub db: DbArgs,

    /// Kind of runs to list
    #[arg(short, long, value_enum, default_value_t = Source::Jmeter)]
    pub source: Source,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[instrument(level = "info", name = "cmd::runs", skip_all)]
pub fn execute(args: &Args, config: &Config) -> Result<()> {
    let store = open_existing_store(&args.db.resolve(config))?;
    let test_type: TestType = args.source.into();
    let runs = store.runs(test_type)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("No {test_type} runs stored");
        return Ok(());
    }

    println!("{}", runs_table(&runs));
    Ok(())
}
