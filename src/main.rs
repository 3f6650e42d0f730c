//! majka-crawl main entry point
//!
//! This is the command-line interface for the bounded text-mining crawler.

use anyhow::Context;
use clap::Parser;
use kgs_crawl::config::{load_config, validate, Config};
use kgs_crawl::output::print_report;
use kgs_crawl::Coordinator;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

/// majka-crawl: a bounded crawler for text mining
///
/// Crawls outward from a seed URL within a link depth and a number of site
/// boundary crossings, keeps pages written in the target language, and saves
/// each one as numbered original, text and link files.
#[derive(Parser, Debug)]
#[command(name = "majka-crawl")]
#[command(version)]
#[command(about = "A bounded crawler for text mining", long_about = None)]
struct Cli {
    /// Seed URL the crawl starts from
    #[arg(short, long, value_name = "URL")]
    url: String,

    /// Maximum number of site boundary crossings along a link path
    #[arg(long, value_name = "N")]
    hops: Option<u32>,

    /// Maximum number of link steps from the seed
    #[arg(long, value_name = "N")]
    depth: Option<u32>,

    /// Data directory receiving original/, parsed/, links/ and ids.txt
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Target language as an ISO 639-3 code (e.g. ces)
    #[arg(long, value_name = "CODE")]
    language: Option<String>,

    /// Number of pages processed concurrently
    #[arg(long, value_name = "N")]
    workers: Option<u32>,

    /// Validate settings and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    let seed = Url::parse(&cli.url).with_context(|| format!("Invalid seed URL '{}'", cli.url))?;

    if cli.dry_run {
        handle_dry_run(&config, &seed);
        return Ok(());
    }

    handle_crawl(config, &seed).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kgs_crawl=info,majka_crawl=info,warn"),
            1 => EnvFilter::new("kgs_crawl=debug,majka_crawl=debug,info"),
            2 => EnvFilter::new("kgs_crawl=trace,majka_crawl=trace,debug"),
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

/// Loads the configuration file, if any, and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(hops) = cli.hops {
        config.crawler.max_hops = hops;
    }
    if let Some(depth) = cli.depth {
        config.crawler.max_depth = depth;
    }
    if let Some(dir) = &cli.dir {
        config.output.data_dir = dir.clone();
    }
    if let Some(language) = &cli.language {
        config.language.target = language.clone();
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }

    validate(&config).context("Invalid settings")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective settings
fn handle_dry_run(config: &Config, seed: &Url) {
    println!("=== majka-crawl Dry Run ===\n");

    println!("Seed: {}", seed);

    println!("\nCrawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max hops: {}", config.crawler.max_hops);
    println!("  Workers: {}", config.crawler.workers);

    println!("\nFetching:");
    println!("  Connect timeout: {:?}", config.fetch.connect_timeout());
    println!("  Read timeout: {:?}", config.fetch.read_timeout());
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nTarget language: {}", config.language.target);
    println!("Data directory: {}", config.output.data_dir.display());

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, seed: &Url) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config).context("Failed to set up crawler")?;

    let cancel = coordinator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing pages in flight");
            cancel.cancel();
        }
    });

    match coordinator.run(seed).await {
        Ok(report) => {
            tracing::info!("Crawl completed successfully");
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
