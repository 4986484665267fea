use crate::commands::{run_apply_overrides, run_replay, run_stats, run_sweep};
use clap::{Args, Parser, Subcommand};
use list_hygiene::config::AppConfig;
use list_hygiene::error::AppError;
use list_hygiene::telemetry;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "list-hygiene",
    about = "Re-verify mailing list addresses and unsubscribe the bad ones",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify every unchecked active subscriber and unsubscribe bad addresses
    Sweep(SweepArgs),
    /// Unsubscribe the addresses flagged in a hand-edited CSV file
    ApplyOverrides(OverrideArgs),
    /// Re-apply every bad address recorded in the checkpoint log
    Replay(CheckpointArgs),
    /// Summarize the checkpoint log
    Stats(CheckpointArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct CheckpointArgs {
    /// Override the configured checkpoint log path
    #[arg(long)]
    pub(crate) checkpoint: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SweepArgs {
    #[command(flatten)]
    pub(crate) log: CheckpointArgs,
    /// Check at most this many pending addresses in this run
    #[arg(long)]
    pub(crate) limit: Option<usize>,
}

#[derive(Args, Debug)]
pub(crate) struct OverrideArgs {
    /// CSV file with `email` and `unsubscribed` columns
    pub(crate) file: PathBuf,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(?config.environment, "list hygiene starting");

    match cli.command {
        Command::Sweep(args) => run_sweep(&config, args).await,
        Command::ApplyOverrides(args) => run_apply_overrides(&config, args).await,
        Command::Replay(args) => run_replay(&config, args).await,
        Command::Stats(args) => run_stats(&config, args),
    }
}
