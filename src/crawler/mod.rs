//! Crawler module for catalog discovery, fetching and extraction
//!
//! This module contains the sweep pipeline:
//! - HTTP fetching over a shared client
//! - HTML queries and link extraction
//! - Item detail extraction
//! - Sequential frontier discovery
//! - Concurrent fetch orchestration

mod extractor;
mod fetcher;
mod frontier;
mod orchestrator;
mod parser;

pub use extractor::{
    extract_item, extract_item_from_markup, parse_amount, parse_attributes, parse_stock,
    ExtractionCause, ExtractionError, ItemField, ItemRecord,
};
pub use fetcher::{build_http_client, FetchError, FetchFailure, Fetcher};
pub use frontier::{category_links, item_links, listing_links, CategoryRef, FrontierBuilder};
pub use orchestrator::{ItemFailure, Orchestrator, SweepEvent, SweepOutcome};
pub use parser::{compile_selector, extract_links, Document, SiteSelectors};

use crate::config::Config;
use crate::url::parse_absolute;
use crate::SweepError;

/// Runs a complete sweep
///
/// This is the main entry point for harvesting a catalog. It will:
/// 1. Compile the site selectors and build the HTTP client
/// 2. Discover categories and listing pages sequentially
/// 3. Fetch listing and item pages concurrently
/// 4. Return the aggregated records and the run report
///
/// Persisting the outcome is left to the caller.
///
/// # Returns
///
/// * `Ok(SweepOutcome)` - The sweep completed, possibly with tolerated failures
/// * `Err(SweepError)` - The configuration was unusable or the frontier could
///   not be discovered
///
/// # Example
///
/// ```no_run
/// use catalog_sweep::config::Config;
/// use catalog_sweep::crawler::sweep;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let outcome = sweep(&Config::default()).await?;
/// println!("{} items", outcome.store.item_count());
/// # Ok(())
/// # }
/// ```
pub async fn sweep(config: &Config) -> Result<SweepOutcome, SweepError> {
    let selectors = SiteSelectors::compile(&config.selectors)?;
    let base = parse_absolute(config.site.effective_base_url())?;
    let fetcher = Fetcher::from_config(&config.crawler)?;

    let started_at = chrono::Utc::now();

    let categories = {
        let frontier = FrontierBuilder::new(&fetcher, &selectors, &base);
        match frontier.discover_categories(&config.site.seed_url).await {
            Ok(categories) => categories,
            Err(e) => {
                tracing::error!("Frontier discovery failed: {}", e);
                return Err(e.into());
            }
        }
    };

    let orchestrator = Orchestrator::new(
        fetcher,
        selectors,
        base,
        config.crawler.max_concurrent_requests as usize,
    );

    let mut outcome = orchestrator.run(&categories).await;
    outcome.report.started_at = started_at;

    Ok(outcome)
}
