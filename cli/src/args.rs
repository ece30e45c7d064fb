//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Ad-blocker detection and variant routing
#[derive(Parser)]
#[command(name = "adgate")]
#[command(about = "Replay page environments through the adgate detection pipeline", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the page-load pipeline against a scripted page and print a JSON report
    Replay(ReplayArgs),
}

#[derive(Args)]
pub struct ReplayArgs {
    /// Scenario TOML describing the page and the blocker on it
    pub scenario: PathBuf,

    /// Config file (overrides $ADGATE_CONFIG and ~/.adgate/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Run the recheck flow after the page load
    #[arg(long)]
    pub recheck: bool,

    /// Turn the blocker off before rechecking
    #[arg(long, requires = "recheck")]
    pub whitelist: bool,

    /// Pretty-print the report
    #[arg(long)]
    pub pretty: bool,
}
