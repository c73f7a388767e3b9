//! gibdd-crashes main entry point
//!
//! Command-line interface for retrieving crash statistics from stat.gibdd.ru.

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use gibdd_crashes::config::{load_config_with_hash, validate, Config};
use gibdd_crashes::output::{dir_name, CsvExporter};
use gibdd_crashes::region::{load_directory, save_directory, DirectoryClient};
use gibdd_crashes::{CountryDirectory, Region, RegionFanOut, Transport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// gibdd-crashes: road crash statistics retrieval
///
/// Resolves the OKATO region directory, fetches crash cards for regions and
/// date ranges, and exports them as CSV tables.
#[derive(Parser, Debug)]
#[command(name = "gibdd-crashes")]
#[command(version)]
#[command(about = "Road crash statistics retrieval", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the region directory and write the cache file
    Regions,

    /// Fetch crashes of a federal region or a subregion and export them
    Crashes {
        /// OKATO code of the region
        #[arg(long)]
        region: String,

        #[command(flatten)]
        period: Period,

        /// Fetch subregions one after another instead of concurrently
        #[arg(long)]
        sequential: bool,
    },

    /// Fetch crashes of every federal region and export them
    Country {
        #[command(flatten)]
        period: Period,
    },

    /// Count crashes of a region without fetching the cards
    Count {
        /// OKATO code of the region
        #[arg(long)]
        region: String,

        #[command(flatten)]
        period: Period,
    },
}

#[derive(Args, Debug, Clone, Copy)]
struct Period {
    /// First day of the period (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    start: NaiveDate,

    /// Last day of the period (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    end: NaiveDate,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{}': {}", value, e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_settings(cli.config.as_deref())?;
    let transport = Arc::new(Transport::new(&config).context("Failed to build HTTP transport")?);

    match cli.command {
        Command::Regions => handle_regions(&config, transport).await,
        Command::Crashes {
            region,
            period,
            sequential,
        } => handle_crashes(&config, transport, &region, period, sequential).await,
        Command::Country { period } => handle_country(&config, transport, period).await,
        Command::Count { region, period } => {
            handle_count(&config, transport, &region, period).await
        }
    }
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gibdd_crashes=info,warn"),
            1 => EnvFilter::new("gibdd_crashes=debug,info"),
            2 => EnvFilter::new("gibdd_crashes=trace,debug"),
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

fn load_settings(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Loads the directory cache, fetching and caching it when absent
async fn load_or_fetch_directory(
    config: &Config,
    transport: Arc<Transport>,
) -> anyhow::Result<CountryDirectory> {
    let cache = Path::new(&config.output.directory_cache);
    if cache.exists() {
        return load_directory(cache)
            .with_context(|| format!("Failed to load region directory {}", cache.display()));
    }

    tracing::info!("No region directory at {}, fetching it", cache.display());
    let directory = DirectoryClient::new(transport)
        .fetch_country_directory()
        .await
        .context("Failed to fetch region directory")?;
    save_directory(cache, &directory)?;
    Ok(directory)
}

async fn handle_regions(config: &Config, transport: Arc<Transport>) -> anyhow::Result<()> {
    let directory = DirectoryClient::new(transport)
        .fetch_country_directory()
        .await
        .context("Failed to fetch region directory")?;

    let cache = Path::new(&config.output.directory_cache);
    save_directory(cache, &directory)?;

    println!(
        "✓ {} federal regions, {} districts written to {}",
        directory.regions.len(),
        directory.district_count(),
        cache.display()
    );
    Ok(())
}

async fn handle_crashes(
    config: &Config,
    transport: Arc<Transport>,
    code: &str,
    period: Period,
    sequential: bool,
) -> anyhow::Result<()> {
    let directory = load_or_fetch_directory(config, Arc::clone(&transport)).await?;
    let region = directory
        .get_region(code)
        .ok_or_else(|| anyhow!("Unknown region code '{}'", code))?;

    let fanout = RegionFanOut::from_config(transport, &config.fetch);
    let exporter = CsvExporter::new(&config.output.export_dir);

    let written = match region {
        Region::Federal(federal) => {
            let fetched = if sequential {
                fanout
                    .fetch_region_sequential(federal, period.start, period.end)
                    .await
            } else {
                fanout.fetch_region(federal, period.start, period.end).await
            };
            let crashes = fetched
                .with_context(|| format!("Failed to fetch crashes for {}", federal.name))?;

            exporter.export_region(&federal.name, &crashes)?
        }
        Region::Subregion { parent, region } => {
            let pages = fanout
                .aggregator()
                .fetch_range(
                    parent.okato_code()?,
                    region.okato_code()?,
                    period.start,
                    period.end,
                )
                .await
                .with_context(|| format!("Failed to fetch crashes for {}", region.name))?;

            let relative = PathBuf::from(dir_name(&parent.name)).join(dir_name(&region.name));
            exporter.export_pages(&relative, &pages)?.crashes.len()
        }
    };

    println!(
        "✓ {} crashes for {} exported to {}",
        written,
        region.name(),
        exporter.root().display()
    );
    Ok(())
}

async fn handle_country(
    config: &Config,
    transport: Arc<Transport>,
    period: Period,
) -> anyhow::Result<()> {
    let directory = load_or_fetch_directory(config, Arc::clone(&transport)).await?;
    let fanout = RegionFanOut::from_config(transport, &config.fetch);

    let crashes = fanout
        .fetch_country(&directory, period.start, period.end)
        .await
        .context("Failed to fetch crashes for the country")?;

    let exporter = CsvExporter::new(&config.output.export_dir);
    let written = exporter.export_country(&crashes)?;

    println!(
        "✓ {} crashes for {} exported to {}",
        written,
        CountryDirectory::NAME,
        exporter.root().display()
    );
    Ok(())
}

async fn handle_count(
    config: &Config,
    transport: Arc<Transport>,
    code: &str,
    period: Period,
) -> anyhow::Result<()> {
    let directory = load_or_fetch_directory(config, Arc::clone(&transport)).await?;
    let region = directory
        .get_region(code)
        .ok_or_else(|| anyhow!("Unknown region code '{}'", code))?;

    let fanout = RegionFanOut::from_config(transport, &config.fetch);
    let count = match region {
        Region::Federal(federal) => {
            fanout
                .count_region(federal, period.start, period.end)
                .await?
        }
        Region::Subregion { parent, region } => {
            fanout
                .aggregator()
                .count_range(
                    parent.okato_code()?,
                    region.okato_code()?,
                    period.start,
                    period.end,
                )
                .await?
        }
    };

    println!(
        "{}: {} crashes between {} and {}",
        region.name(),
        count,
        period.start,
        period.end
    );
    Ok(())
}
