//! Stack-Scrape main entry point
//!
//! This is the command-line interface that starts the API server.

use clap::Parser;
use stack_scrape::config::{load_config_with_hash, Config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the listen port
const PORT_ENV: &str = "STACKOVERFLOW_API_PORT";

/// Stack-Scrape: a Stack Exchange-style API over scraped Stack Overflow pages
///
/// Every request is answered by scraping the live site: listing pages,
/// question pages, post timelines and user profiles.
#[derive(Parser, Debug)]
#[command(name = "stack-scrape")]
#[command(version)]
#[command(about = "Stack Exchange-style API over scraped Stack Overflow pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Port to listen on, overriding the environment and the config file
    #[arg(long)]
    port: Option<u16>,

    /// Validate the configuration, print it and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let port = resolve_port(cli.port, std::env::var(PORT_ENV).ok(), &config)?;

    if cli.check_config {
        print_config(&config, port);
        return Ok(());
    }

    tracing::info!(
        "Scraping {} with at most {} requests in flight",
        config.site.base_url,
        config.fetcher.max_concurrent
    );

    if let Err(e) = stack_scrape::api::serve(&config, port).await {
        tracing::error!("Server failed: {}", e);
        return Err(e);
    }
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG`, when set, takes precedence over the flags.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            // Only show errors
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("stack_scrape=info,warn"),
                1 => EnvFilter::new("stack_scrape=debug,info"),
                2 => EnvFilter::new("stack_scrape=trace,debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// `--port`, then the environment, then the config file
fn resolve_port(flag: Option<u16>, env: Option<String>, config: &Config) -> anyhow::Result<u16> {
    if let Some(port) = flag {
        return Ok(port);
    }
    match env {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} is not a valid port: {:?}", PORT_ENV, value)),
        None => Ok(config.server.port),
    }
}

/// Handles --check-config: shows the effective settings
fn print_config(config: &Config, port: u16) {
    println!("=== Stack-Scrape Configuration ===\n");

    println!("Site: {}", config.site.base_url);

    println!("\nFetcher:");
    println!("  Max concurrent: {}", config.fetcher.max_concurrent);
    println!("  Rate window: {}ms", config.fetcher.rate_window_ms);
    println!("  Retry budget: {}s", config.fetcher.retry_budget_secs);
    println!(
        "  Default Retry-After: {}s",
        config.fetcher.default_retry_after_secs
    );
    println!("  Request timeout: {}s", config.fetcher.request_timeout_secs);
    println!("  Max listing pages: {}", config.fetcher.max_listing_pages);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);

    println!("\nServer: {}:{}", config.server.host, port);
    match &config.output.dump_dir {
        Some(dir) => println!("Dump directory: {}", dir),
        None => println!("Dump directory: (disabled)"),
    }

    println!("\n✓ Configuration is valid");
}
