//! adgate CLI - Binary entry point.
//!
//! ```text
//! main() -> Cli::parse() -> replay::run() -> AdGate over ScriptedPage -> JSON on stdout
//! ```
//!
//! Logs go to stderr so stdout stays machine-readable.

mod args;
mod replay;

use std::io::{Write, stdout};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::args::{Cli, Commands};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Replay(args) => {
            let report = replay::run(&args).await?;
            let json = if args.pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            let mut out = stdout().lock();
            writeln!(out, "{json}")?;
        }
    }
    Ok(())
}
