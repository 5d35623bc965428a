//! renewtrack CLI: contract renewal tracking from the command line.
//!
//! Scans a folder of contract documents for renewal dates, stores them, and
//! emails a reminder when a renewal comes due.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
