//! jobharvest CLI — scrape a job board into destination-ready artifacts.
//!
//! Sequences the pipeline stages (scrape, link, adopt, convert, accept);
//! all pipeline logic lives in the library crates.

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
