//! Command-line interface for rbs.

use std::path::PathBuf;

use clap::Parser;

pub mod commands;
pub mod output;

pub use commands::Commands;

#[derive(Parser, Debug)]
#[command(name = "rbs", version, about = "Review Bandit Simulator", long_about = None)]
pub struct Cli {
    /// Config file (defaults to the global rbs config)
    #[arg(long, global = true, env = "RBS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Machine-readable JSON output on stdout
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable logging and progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}
