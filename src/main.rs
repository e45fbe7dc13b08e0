//! Kumo-Crawl main entry point
//!
//! Command-line interface for running a bounded crawl session from a TOML
//! configuration file.

use clap::Parser;
use kumo_crawl::config::load_config_with_hash;
use kumo_crawl::crawler::{CrawlSession, HtmlLinkParser, HttpFetcher};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Kumo-Crawl: a bounded concurrent crawl engine
///
/// Crawls outward from the configured seed URLs with a fixed pool of
/// workers, visiting each URL at most once and stopping when the reachable
/// graph is exhausted or the item budget is spent.
#[derive(Parser, Debug)]
#[command(name = "kumo-crawl")]
#[command(version)]
#[command(about = "A bounded concurrent crawl engine", long_about = None)]
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

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Override the configured item budget
    #[arg(long, value_name = "N")]
    max_items: Option<usize>,

    /// Override the configured worker count
    #[arg(long, value_name = "N")]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(max_items) = cli.max_items {
        config.crawler.max_items = max_items;
    }
    if let Some(workers) = cli.workers {
        config.crawler.worker_count = workers;
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kumo_crawl=info,warn"),
            1 => EnvFilter::new("kumo_crawl=debug,info"),
            2 => EnvFilter::new("kumo_crawl=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &kumo_crawl::config::Config) {
    println!("=== Kumo-Crawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Item budget: {}", config.crawler.max_items);
    println!("  Worker count: {}", config.crawler.worker_count);
    println!("  Shutdown grace: {}ms", config.crawler.shutdown_grace_ms);
    println!(
        "  Late writes: {}",
        if config.crawler.accept_late_writes {
            "accepted"
        } else {
            "dropped"
        }
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl from {} seed URLs", config.seeds.len());
}

/// Handles the main crawl operation
async fn handle_crawl(config: kumo_crawl::config::Config) -> anyhow::Result<()> {
    let fetcher = HttpFetcher::new(&config.user_agent)?;
    let session = CrawlSession::new(config.crawler.clone(), fetcher, HtmlLinkParser::new());

    // Ctrl-C triggers a graceful drain; in-flight fetches get the grace period
    {
        let session = session.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, shutting down");
                if let Err(e) = session.shutdown().await {
                    tracing::warn!("Shutdown did not finish cleanly: {}", e);
                }
            }
        });
    }

    match session.run(&config.seeds).await {
        Ok(pages) => {
            let stats = session.stats();
            println!("\n=== Crawl Summary ===");
            println!("Pages stored: {}", pages.len());
            println!("URLs admitted: {}", stats.admitted);
            println!("Fetch failures: {}", stats.failed);
            if stats.dropped_late_writes > 0 {
                println!("Late writes dropped: {}", stats.dropped_late_writes);
            }
            if let (Some(start), Some(finish)) = (stats.started_at, stats.finished_at) {
                println!("Elapsed: {}ms", (finish - start).num_milliseconds());
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
