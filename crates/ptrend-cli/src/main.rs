#![deny(unsafe_code)]

mod commands;
mod config;
mod exit_code;
mod output;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ptrend_core::error::{AlignmentError, IngestError, StoreError};

use crate::commands::{
    completions, export, generate, parse_jmeter, parse_wpt, runs, MissingFile, UsageError,
};
use crate::config::Config;

/// Performance trends across JMeter and WebPageTest runs
#[derive(Parser)]
#[command(name = "ptrend")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # Store a load test run made of two log files
    ptrend parse-jmeter \"release 42\" node1.csv node2.csv -f -i '^TC '

    # Store a WebPageTest result
    ptrend parse-wpt result.json

    # Export 90th percentiles of every run
    ptrend export -m perc90 -n perc90.csv

    # Build the HTML report into ./report
    ptrend generate -o report
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress logging and error output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse JMeter logs of one run and store per-request statistics
    ParseJmeter(parse_jmeter::Args),

    /// Store a WebPageTest JSON result as a run
    ParseWpt(parse_wpt::Args),

    /// Export one metric of all runs to CSV
    Export(export::Args),

    /// Generate an HTML or JSON trend report
    Generate(generate::Args),

    /// List stored runs
    Runs(runs::Args),

    /// Generate shell completions
    Completions(completions::Args),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    match run(cli) {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            if !quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::from(categorize_error(&e))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    if !cli.quiet {
        setup_tracing(config.verbosity(cli.verbose));
    }

    match cli.command {
        Commands::ParseJmeter(args) => parse_jmeter::execute(&args, &config),
        Commands::ParseWpt(args) => parse_wpt::execute(&args, &config),
        Commands::Export(args) => export::execute(&args, &config),
        Commands::Generate(args) => generate::execute(&args, &config),
        Commands::Runs(args) => runs::execute(&args, &config),
        Commands::Completions(args) => completions::execute(&args),
    }
}

/// Set up tracing/logging based on verbosity level
fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

/// Map an error to an exit code by walking its chain for known types
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if cause.downcast_ref::<UsageError>().is_some() {
            return exit_code::USAGE_ERROR;
        }

        if cause.downcast_ref::<MissingFile>().is_some() {
            return exit_code::NOT_FOUND;
        }

        if let Some(store_err) = cause.downcast_ref::<StoreError>() {
            match store_err {
                StoreError::DuplicateDescription(_) => return exit_code::DUPLICATE_RUN,
                StoreError::EmptyDescription => return exit_code::USAGE_ERROR,
                StoreError::ValueOutOfRange { .. } => return exit_code::DATA_INTEGRITY,
                StoreError::Sqlite(_) => {}
            }
        }

        if cause.downcast_ref::<AlignmentError>().is_some() {
            return exit_code::DATA_INTEGRITY;
        }

        if let Some(ingest_err) = cause.downcast_ref::<IngestError>() {
            return match ingest_err {
                IngestError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                    exit_code::NOT_FOUND
                }
                IngestError::Io { .. } => exit_code::GENERAL_ERROR,
                _ => exit_code::INVALID_INPUT,
            };
        }

        if let Some(io_err) = cause.downcast_ref::<io::Error>()
            && io_err.kind() == io::ErrorKind::NotFound
        {
            return exit_code::NOT_FOUND;
        }
    }

    exit_code::GENERAL_ERROR
}
