//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use jobharvest_blobs::BlobStore;
use jobharvest_core::pipeline;
use jobharvest_core::{RunTrackers, Taxonomies};
use jobharvest_shared::{init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// jobharvest — job board scraping pipeline.
#[derive(Parser)]
#[command(
    name = "jobharvest",
    version,
    about = "Scrape job listings, link them to companies, and emit destination-ready artifacts.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path (defaults to ~/.jobharvest/jobharvest.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the whole pipeline: scrape, convert, accept.
    All,

    /// Fetch listings and details, extract records, and link them.
    Scrape {
        /// Listing pages to fetch, e.g. "1-40" or "1,3,7-9".
        #[arg(long)]
        pages: Option<String>,
    },

    /// Re-link the raw records currently in storage.
    Link,

    /// Fetch missing companies for orphan jobs and re-link them.
    Adopt,

    /// Convert linked records to the destination shape and project them.
    Convert,

    /// Copy the merged artifacts to the hand-off directory.
    Accept,

    /// Initialize the config file with defaults.
    Init,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "jobharvest=info",
        1 => "jobharvest=debug",
        _ => "jobharvest=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Init = cli.command {
        let path = init_config()?;
        println!("  Wrote default config to {}", path.display());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    let store = BlobStore::new(&config.output.root);
    let taxonomies = Taxonomies::load(Path::new(&config.output.taxonomy_dir))
        .map_err(|e| eyre!("failed to load taxonomy tables: {e}"))?;
    let mut trackers = RunTrackers::new();

    match cli.command {
        Command::All => {
            let spinner = phase_spinner("Running full pipeline");
            let (scrape, convert) =
                pipeline::run_all(&config, &store, &taxonomies, &mut trackers).await?;
            spinner.finish_and_clear();

            print_scrape_summary(&scrape);
            print_convert_summary(&convert);
            println!("  Deployed to {}", config.output.deploy_dir);
        }
        Command::Scrape { pages } => {
            let mut config = config;
            if let Some(pages) = pages {
                config.fetch.pages = pages;
            }

            let spinner = phase_spinner("Scraping listings and details");
            let summary = pipeline::run_scrape(&config, &store, &taxonomies, &mut trackers).await?;
            spinner.finish_and_clear();

            print_scrape_summary(&summary);
        }
        Command::Link => {
            let (linked, orphans) = pipeline::run_link(&store, &taxonomies, &mut trackers)?;
            println!("  Linked:  {linked}");
            println!("  Orphans: {orphans}");
        }
        Command::Adopt => {
            let spinner = phase_spinner("Fetching companies for orphans");
            let adopted = pipeline::run_adopt(&config, &store, &taxonomies, &mut trackers).await?;
            spinner.finish_and_clear();

            println!("  Adopted: {adopted}");
        }
        Command::Convert => {
            let summary = pipeline::run_convert(&store, &taxonomies, &config.bounds)?;
            print_convert_summary(&summary);
        }
        Command::Accept => {
            pipeline::run_accept(&store, Path::new(&config.output.deploy_dir))?;
            println!("  Deployed to {}", config.output.deploy_dir);
        }
        Command::Init => unreachable!("handled above"),
    }

    let stats = pipeline::stats_dir(&store);
    trackers.write_reports(&stats)?;
    info!(path = %stats.display(), "wrote classification reports");

    Ok(())
}

fn print_scrape_summary(summary: &pipeline::ScrapeSummary) {
    println!();
    println!("  Listing pages: {}", summary.listing_pages);
    println!("  Jobs:          {}", summary.jobs);
    println!("  Companies:     {}", summary.companies);
    println!("  Linked:        {}", summary.linked);
    println!("  Orphans:       {}", summary.orphans);
}

fn print_convert_summary(summary: &pipeline::ConvertSummary) {
    println!();
    println!("  Offers:    {}", summary.offers);
    println!("  Companies: {}", summary.companies);
}

fn phase_spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("static spinner template"),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));
    spinner
}
