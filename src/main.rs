//! acx-harvest main entry point
//!
//! This is the command-line interface for the publication archive harvester.

use acx_harvest::config::load_config_with_hash;
use acx_harvest::crawler::{Coordinator, Pipeline};
use acx_harvest::output::{load_statistics, print_statistics, stats::DEFAULT_RUN_LIMIT};
use acx_harvest::storage::open_storage;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// acx-harvest: mirror a Substack archive into SQLite
///
/// Lists every article of the publication, harvests the full comment tree of
/// each listed article and fetches article bodies. Each step reads what the
/// previous one stored, so they can be run separately or together with `all`.
#[derive(Parser, Debug)]
#[command(name = "acx-harvest")]
#[command(version)]
#[command(about = "Mirror a Substack archive into SQLite", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the SQLite database (default: acx-comments_<today>.db)
    #[arg(short, long, global = true, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Page through the archive and store article metadata
    Articles,
    /// Store the comment tree of every stored article
    Comments,
    /// Fetch the body of every stored article
    Bodies,
    /// Run articles, comments and bodies in that order
    All,
    /// Show statistics from the database and exit
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let database = cli.database.unwrap_or_else(default_database_path);

    let pipelines = match cli.command {
        Command::Stats => return handle_stats(&database),
        Command::Articles => vec![Pipeline::Articles],
        Command::Comments => vec![Pipeline::Comments],
        Command::Bodies => vec![Pipeline::Bodies],
        Command::All => Pipeline::ALL.to_vec(),
    };

    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults"),
    }
    let (config, config_hash) =
        load_config_with_hash(cli.config.as_deref()).context("Failed to load configuration")?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let mut coordinator = Coordinator::new(&config, config_hash, &database)
        .with_context(|| format!("Failed to open {}", database.display()))?;

    // Later pipelines read what earlier ones stored, so stop at the first failure
    for pipeline in pipelines {
        match coordinator.run(pipeline).await {
            Ok(report) => println!("{}", report.summary()),
            Err(e) => {
                tracing::error!("The {} run failed: {}", pipeline, e);
                return Err(e).with_context(|| format!("The {} run failed", pipeline));
            }
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("acx_harvest=info,warn"),
            1 => EnvFilter::new("acx_harvest=debug,info"),
            2 => EnvFilter::new("acx_harvest=trace,debug"),
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

fn default_database_path() -> PathBuf {
    PathBuf::from(format!(
        "acx-comments_{}.db",
        chrono::Local::now().format("%Y-%m-%d")
    ))
}

/// Handles the stats command: shows statistics from the database
fn handle_stats(database: &std::path::Path) -> anyhow::Result<()> {
    println!("Database: {}\n", database.display());

    let storage = open_storage(database)
        .with_context(|| format!("Failed to open {}", database.display()))?;
    let stats = load_statistics(&storage, DEFAULT_RUN_LIMIT)?;

    print_statistics(&stats);

    Ok(())
}
