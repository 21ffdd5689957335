//! Archive-Mirror main entry point
//!
//! This is the command-line interface for the Archive-Mirror judgment scraper.

use anyhow::Context;
use archive_mirror::config::{load_config_or_default, validate, validate_months, Config};
use archive_mirror::crawler::{run_archive, YearSpan};
use archive_mirror::output::print_summary;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Archive-Mirror: a resumable mirror of a paginated judgment archive
///
/// Walks the monthly index of every requested year, downloads each judgment
/// (stitching multi-page documents back together) and records its metadata.
/// Documents already on disk are skipped, so interrupted runs can simply be
/// started again.
#[derive(Parser, Debug)]
#[command(name = "archive-mirror")]
#[command(version = "1.0.0")]
#[command(about = "Resumable mirror of a paginated judgment archive", long_about = None)]
struct Cli {
    /// First year to scrape
    #[arg(long, default_value_t = 2025)]
    start: i32,

    /// Last year to scrape (years are walked backwards when earlier than --start)
    #[arg(long, default_value_t = 1955)]
    end: i32,

    /// Specific months (1-12) to scrape; all months when omitted
    #[arg(long, num_args = 1..)]
    months: Vec<u32>,

    /// Output directory
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Enable aggressive mode (no delay, more retries)
    #[arg(long)]
    aggressive: bool,

    /// Optional TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the number of concurrent document workers
    #[arg(long)]
    workers: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    validate_months(&cli.months)?;

    let span = YearSpan::between(cli.start, cli.end);
    tracing::info!(
        "Archive mirror | {} -> {} | output: {}",
        cli.start,
        cli.end,
        config.output.output_dir.display()
    );

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let summary = run_archive(&config, span, &cli.months, &cancel)
        .await
        .context("failed to start mirror run")?;

    print_summary(&summary);
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("archive_mirror=info,warn"),
            1 => EnvFilter::new("archive_mirror=debug,info"),
            2 => EnvFilter::new("archive_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the optional config file and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = load_config_or_default(cli.config.as_deref()).with_context(|| {
        format!(
            "failed to load configuration{}",
            cli.config
                .as_ref()
                .map(|p| format!(" from {}", p.display()))
                .unwrap_or_default()
        )
    })?;

    if cli.aggressive {
        config.apply_aggressive();
    }
    if let Some(output) = &cli.output {
        config.output.output_dir = output.clone();
    }
    if let Some(workers) = cli.workers {
        config.crawl.workers = Some(workers);
    }

    validate(&config)?;
    Ok(config)
}

/// Cancels the run on the first Ctrl-C and exits on the second
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if should_force_exit(&cancel) {
                tracing::error!("Second interrupt received, exiting immediately");
                std::process::exit(130);
            }
        }
    });
}

/// Handles one interrupt; returns true when a previous one already cancelled the run
fn should_force_exit(cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return true;
    }
    tracing::warn!("Interrupt received, stopping after the current month (Ctrl-C again to exit now)");
    cancel.cancel();
    false
}
