//! Catalog-Ripple main entry point
//!
//! This is the command-line interface for the Catalog-Ripple catalog crawler.

use anyhow::{Context, Result};
use catalog_ripple::config::{load_config_with_hash, Config};
use catalog_ripple::crawler::crawl;
use catalog_ripple::output::{generate_markdown_summary, print_statistics};
use catalog_ripple::sites::{build_site, SiteKind};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Catalog-Ripple: a product catalog crawler
///
/// Catalog-Ripple walks the category menus of the configured retail sites,
/// follows every listing page, fetches each product once and writes one
/// JSON line per listing sighting and per product color.
#[derive(Parser, Debug)]
#[command(name = "catalog-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A product catalog crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Only crawl these sites (repeatable)
    #[arg(long = "site", value_name = "KIND")]
    sites: Vec<SiteKind>,

    /// Only crawl these markets by country code (repeatable)
    #[arg(long = "country", value_name = "CODE")]
    countries: Vec<String>,

    /// Fetch one known product per site instead of the whole catalog
    #[arg(long)]
    single_item: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_cli_filters(&mut config, &cli);

    if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_crawl(config, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_ripple=info,warn"),
            1 => EnvFilter::new("catalog_ripple=debug,info"),
            2 => EnvFilter::new("catalog_ripple=trace,debug"),
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

/// Narrows the configured sites and markets to what the command line asks for
fn apply_cli_filters(config: &mut Config, cli: &Cli) {
    for entry in &mut config.sites {
        if !cli.sites.is_empty() && !cli.sites.contains(&entry.kind) {
            entry.enabled = false;
        }
        if !cli.countries.is_empty() {
            entry.countries = cli
                .countries
                .iter()
                .map(|code| code.to_ascii_lowercase())
                .collect();
        }
        if cli.single_item {
            entry.single_item_test = true;
        }
    }

    for kind in &cli.sites {
        if !config.sites.iter().any(|entry| entry.kind == *kind) {
            tracing::warn!("Site '{}' is not in the configuration, ignoring", kind);
        }
    }
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<()> {
    println!("=== Catalog-Ripple Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Retries: {} (delay {}ms)",
        config.crawler.max_retries, config.crawler.retry_delay_ms
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);
    println!("  Summary: {}", config.output.summary_path);

    let mut start_count = 0;
    println!("\nSites ({} enabled):", config.enabled_sites().count());
    for entry in config.enabled_sites() {
        let site = build_site(entry)
            .with_context(|| format!("failed to set up site '{}'", entry.kind))?;
        let start = site.start_directives();
        start_count += start.len();

        println!(
            "  - {} (dedup scope {:?}{})",
            entry.kind,
            entry.dedup_scope,
            if entry.single_item_test {
                ", single item"
            } else {
                ""
            }
        );
        for directive in &start {
            println!(
                "    * [{}/{}/{}] {} {}",
                directive.context.country_code,
                directive.context.language_code,
                directive.context.currency,
                directive.step,
                directive.target
            );
        }
    }

    if start_count == 0 {
        anyhow::bail!("no start URLs: the site and country filters exclude every market");
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling with {} start URLs", start_count);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> Result<()> {
    let summary_path = PathBuf::from(&config.output.summary_path);

    tracing::info!(
        "Sites: {}",
        config
            .enabled_sites()
            .map(|entry| entry.kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let stats = crawl(config).await.context("crawl failed")?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&stats, config_hash, Path::new(&summary_path))
        .with_context(|| format!("failed to write summary to {}", summary_path.display()))?;

    print_statistics(&stats);
    println!("\n✓ Summary written to: {}", summary_path.display());

    Ok(())
}
