use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod kinds;
pub mod replay;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a recorded capture and print decoded events.
    Replay(ReplayArgs),
    /// List sensor kinds and bulk transfer types.
    Kinds(KindsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Replay(args) => replay::run(args, format),
        Command::Kinds(args) => kinds::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Capture file (length-prefixed transfers).
    pub capture: PathBuf,
    /// Session config (JSON).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Session name used in logs and bulk jobs.
    #[arg(long)]
    pub session: Option<String>,
    /// Start in low-power/gesture mode.
    #[arg(long)]
    pub low_power: bool,
    /// Stop after printing N events.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,
    /// Report malformed transfers and continue instead of stopping.
    #[arg(long)]
    pub keep_going: bool,
}

#[derive(Args, Debug, Default)]
pub struct KindsArgs {
    /// Treat heart-rate sensors as unsupported.
    #[arg(long)]
    pub no_heart_rate: bool,
    /// Treat voice bulk types as unknown.
    #[arg(long)]
    pub no_voice: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
