//! Moto-Harvest main entry point
//!
//! This is the command-line interface for the Moto-Harvest listing harvester.

use anyhow::Context;
use clap::Parser;
use moto_harvest::config::{load_config_with_hash, Config};
use moto_harvest::crawler::{run_harvest, search_form};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Moto-Harvest: a classifieds harvester for vehicle listings
///
/// Moto-Harvest runs a filtered search, visits every result page under a
/// shared concurrency limit, reveals seller phone numbers and stores the
/// previously unseen listings in SQLite.
#[derive(Parser, Debug)]
#[command(name = "moto-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A classifieds harvester for vehicle listings", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the search that would be issued
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("moto_harvest=info,warn"),
            1 => EnvFilter::new("moto_harvest=debug,info"),
            2 => EnvFilter::new("moto_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the configuration and search payload
fn handle_dry_run(config: &Config) {
    println!("=== Moto-Harvest Dry Run ===\n");

    println!("Harvester Configuration:");
    println!("  Concurrency limit: {}", config.harvester.concurrency_limit);
    println!("  Pages limit: {}", config.harvester.pages_limit);
    println!("  Request timeout: {}ms", config.harvester.request_timeout_ms);
    println!(
        "  Retries: {} (delay {}ms)",
        config.harvester.max_retries, config.harvester.retry_delay_ms
    );
    println!("  Phone index cap: {}", config.harvester.max_phone_index);

    println!("\nEndpoints:");
    println!("  Search: {}", config.endpoints.search_url);
    println!("  Phones: {}", config.endpoints.phone_url);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nSearch Form:");
    for (key, value) in search_form(&config.filters, config.endpoints.category_id) {
        println!("  {} = {:?}", key, value);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use moto_harvest::output::{load_statistics, print_statistics};
    use moto_harvest::storage::SqliteStorage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .context("Failed to open database")?;
    let stats = load_statistics(&mut storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Starting harvest: {} (year {}-{}, concurrency {})",
        config.endpoints.search_url,
        config.filters.year_from,
        config.filters.effective_year_to(),
        config.harvester.concurrency_limit
    );

    match run_harvest(config).await {
        Ok(summary) => {
            tracing::info!(
                "Harvest completed: {} new articles ({} failed pages)",
                summary.inserted,
                summary.failed_units
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
