//! Catalog-Sweep main entry point
//!
//! This is the command-line interface for the Catalog-Sweep harvester.

use catalog_sweep::config::{load_config_with_hash, validate, Config};
use catalog_sweep::crawler::sweep;
use catalog_sweep::output::{generate_markdown_report, print_report, read_products, write_products};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Catalog-Sweep: a category-grouped catalog harvester
///
/// Catalog-Sweep discovers a catalog's categories and listing pages, fetches
/// every item page concurrently and writes all items, grouped by category,
/// to a single JSON document.
#[derive(Parser, Debug)]
#[command(name = "catalog-sweep")]
#[command(version)]
#[command(about = "A category-grouped catalog harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Seed page holding the category navigation
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Where to write the products document
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Where to write the markdown run report
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,

    /// Maximum number of requests in flight
    #[arg(short = 'c', long, value_name = "N")]
    concurrency: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be swept without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show per-category counts of an existing products document and exit
    #[arg(long, value_name = "PRODUCTS_JSON", conflicts_with = "dry_run")]
    stats: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Some(path) = &cli.stats {
        return handle_stats(path);
    }

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_sweep(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_sweep=info,warn"),
            1 => EnvFilter::new("catalog_sweep=debug,info"),
            2 => EnvFilter::new("catalog_sweep=trace,debug"),
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

/// Loads the config file (if any) and applies command-line overrides
fn resolve_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(seed) = &cli.seed {
        config.site.seed_url = seed.clone();
    }
    if let Some(output) = &cli.output {
        config.output.products_path = output.display().to_string();
    }
    if let Some(summary) = &cli.summary {
        config.output.summary_path = Some(summary.display().to_string());
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.max_concurrent_requests = concurrency;
    }

    // Overrides must satisfy the same rules as the file
    validate(&config)?;

    Ok(config)
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Sweep Dry Run ===\n");

    println!("Site:");
    println!("  Seed URL: {}", config.site.seed_url);
    println!("  Base URL: {}", config.site.effective_base_url());

    println!("\nSelectors:");
    println!(
        "  Categories: {} {}",
        config.selectors.category_container, config.selectors.category_link
    );
    println!(
        "  Pagination: {} {}",
        config.selectors.pagination_container, config.selectors.pagination_link
    );
    println!("  Item links: {}", config.selectors.item_link);
    println!("  Title: {}", config.selectors.title);
    println!("  SKU: {}", config.selectors.sku);
    println!("  Price: {}", config.selectors.price);
    println!("  Previous price: {}", config.selectors.previous_price);
    println!("  Stock: {}", config.selectors.stock);
    println!("  Description: {}", config.selectors.description_entry);

    println!("\nCrawler:");
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    match config.crawler.request_timeout_secs {
        Some(secs) => println!("  Request timeout: {}s", secs),
        None => println!("  Request timeout: transport default"),
    }
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nOutput:");
    println!("  Products: {}", config.output.products_path);
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: summarizes an existing products document
fn handle_stats(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = read_products(path)?;

    println!("=== Products: {} ===\n", path.display());
    for (name, records) in store.iter() {
        println!("  {}: {} items", name, records.len());
    }
    println!(
        "\nTotal: {} items in {} categories",
        store.item_count(),
        store.category_count()
    );

    Ok(())
}

/// Handles the main sweep operation
async fn handle_sweep(config: Config) -> catalog_sweep::Result<()> {
    tracing::info!("Starting sweep from {}", config.site.seed_url);

    let outcome = match sweep(&config).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Sweep failed: {}", e);
            return Err(e);
        }
    };

    // The document is written even when some pages or items were dropped
    let products_path = Path::new(&config.output.products_path);
    write_products(&outcome.store, products_path)?;
    tracing::info!(
        "Wrote {} items in {} categories to {}",
        outcome.store.item_count(),
        outcome.store.category_count(),
        products_path.display()
    );

    if let Some(summary_path) = &config.output.summary_path {
        generate_markdown_report(&outcome.report, Path::new(summary_path))?;
        tracing::info!("Wrote run report to {}", summary_path);
    }

    outcome.report.log_summary();
    if outcome.report.total_failures() > 0 {
        print_report(&outcome.report);
    }

    Ok(())
}
