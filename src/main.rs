//! Sumi-Scraper main entry point
//!
//! This is the command-line interface for the Sumi-Scraper paginated scraper.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_scraper::config::{load_config, validate, ScraperConfig};
use sumi_scraper::{ConfigResult, PaginationConfig, Scraper};
use tracing_subscriber::EnvFilter;

/// Sumi-Scraper: paginated HTML scraping
///
/// Fetches a page, prints the outer HTML of every element matching SELECTOR,
/// and optionally follows pagination. Rate-limited responses are retried with
/// exponential backoff.
#[derive(Parser, Debug)]
#[command(name = "sumi-scraper")]
#[command(version = "1.0.0")]
#[command(about = "Paginated HTML scraper", long_about = None)]
struct Cli {
    /// Page to start scraping from
    #[arg(value_name = "URL")]
    url: String,

    /// CSS selector of the elements to extract
    #[arg(value_name = "SELECTOR")]
    selector: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Selector of the next-page link (sequential pagination)
    #[arg(long, value_name = "SELECTOR")]
    next: Option<String>,

    /// Selector of the element holding the page count (counted pagination)
    #[arg(long, value_name = "SELECTOR")]
    last: Option<String>,

    /// Page URL template containing `::page::`, used with --last
    #[arg(long, value_name = "PATTERN")]
    pattern: Option<String>,

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

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => ScraperConfig::default(),
    };

    let config = resolve_config(config, &cli).context("invalid pagination options")?;
    let scraper = Scraper::new(config.options)?;

    let mut stream = scraper.scrape_paginated(&cli.url, &cli.selector, &config.pagination)?;

    let mut items = 0usize;
    let mut errors = 0usize;
    while let Some(item) = stream.next_item().await {
        match item {
            Ok(fragment) => {
                items += 1;
                println!("{}", fragment);
            }
            Err(e) => {
                errors += 1;
                tracing::error!("{}", e);
            }
        }
    }

    tracing::info!("Scraped {} elements ({} errors)", items, errors);

    Ok(())
}

/// Applies command-line overrides and validates the merged configuration
fn resolve_config(mut config: ScraperConfig, cli: &Cli) -> ConfigResult<ScraperConfig> {
    config.pagination = apply_overrides(config.pagination, cli);
    config.options = config.options.normalized();
    validate(&config)?;
    Ok(config)
}

/// Layers pagination flags given on the command line over the config file
fn apply_overrides(mut pagination: PaginationConfig, cli: &Cli) -> PaginationConfig {
    if let Some(next) = &cli.next {
        pagination.next_page_selector = Some(next.clone());
    }
    if let Some(last) = &cli.last {
        pagination.last_page_selector = Some(last.clone());
    }
    if let Some(pattern) = &cli.pattern {
        pagination.next_page_url_pattern = Some(pattern.clone());
    }
    pagination
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only extracted elements.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_scraper=info,warn"),
            1 => EnvFilter::new("sumi_scraper=debug,info"),
            2 => EnvFilter::new("sumi_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
