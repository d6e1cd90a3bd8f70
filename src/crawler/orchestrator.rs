//! Concurrent fetch orchestration
//!
//! This module runs the concurrent phase of a sweep:
//! - One task per listing page, which fetches the page and reads its item links
//! - One task per item link, which fetches the detail page and extracts a record
//! - A single collector that owns the aggregation store and the run report
//!
//! Tasks never touch the store; they send [`SweepEvent`]s over a channel and
//! the collector applies them one at a time. Every fetch, at either level,
//! first takes a permit from a shared semaphore, which bounds the number of
//! requests in flight. Permits are held only for the fetch itself, never
//! while a listing task waits for its item tasks.

use crate::crawler::extractor::{extract_item_from_markup, ExtractionError, ItemRecord};
use crate::crawler::fetcher::{FetchError, FetchFailure, Fetcher};
use crate::crawler::frontier::{item_links, CategoryRef};
use crate::crawler::parser::SiteSelectors;
use crate::output::{FailureStage, RunReport};
use crate::store::AggregationStore;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use url::Url;

/// Result of the concurrent phase
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    /// Records grouped by category
    pub store: AggregationStore,

    /// Counts and tolerated failures
    pub report: RunReport,
}

/// Why an item produced no record
#[derive(Debug, Clone)]
pub enum ItemFailure {
    Fetch(FetchError),
    Extraction(ExtractionError),
}

/// Messages from fetch tasks to the collector
#[derive(Debug)]
pub enum SweepEvent {
    /// A listing page was fetched and held this many item links
    ListingFetched { category: String, item_links: usize },

    /// A listing page could not be fetched
    ListingFailed { category: String, error: FetchError },

    /// An item record was extracted
    ItemExtracted { category: String, record: ItemRecord },

    /// An item was dropped
    ItemFailed { category: String, failure: ItemFailure },
}

/// Two-level fan-out over listing pages and their items
#[derive(Debug, Clone)]
pub struct Orchestrator {
    fetcher: Fetcher,
    selectors: Arc<SiteSelectors>,
    base: Arc<Url>,
    gate: Arc<Semaphore>,
}

impl Orchestrator {
    /// Creates an orchestrator
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The shared document fetcher
    /// * `selectors` - Compiled site selectors
    /// * `base` - Base URL for resolving item links
    /// * `max_concurrent_requests` - Fetches allowed in flight at once (at least 1)
    pub fn new(
        fetcher: Fetcher,
        selectors: SiteSelectors,
        base: Url,
        max_concurrent_requests: usize,
    ) -> Self {
        Self {
            fetcher,
            selectors: Arc::new(selectors),
            base: Arc::new(base),
            gate: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
        }
    }

    /// Fetches and extracts every item reachable from the categories
    ///
    /// Completes only after every listing task and every item task has
    /// finished. Failures are recorded in the report and never abort sibling
    /// tasks. Every category key is present in the resulting store, even if
    /// it yielded no records.
    pub async fn run(&self, categories: &[CategoryRef]) -> SweepOutcome {
        let mut store = AggregationStore::new();
        let mut report = RunReport::new();

        for category in categories {
            store.register_category(&category.name);
            report.register_category(&category.name, category.listing_urls.len());
        }

        let (tx, rx) = mpsc::unbounded_channel();

        tracing::info!(
            "Fetching {} listing pages across {} categories",
            categories
                .iter()
                .map(|c| c.listing_urls.len())
                .sum::<usize>(),
            categories.len()
        );

        let ((), (store, mut report)) =
            tokio::join!(self.fan_out(categories, tx), collect(rx, store, report));

        report.finish();
        SweepOutcome { store, report }
    }

    /// Spawns one task per listing page and waits for all of them
    async fn fan_out(&self, categories: &[CategoryRef], tx: mpsc::UnboundedSender<SweepEvent>) {
        let mut listings = JoinSet::new();

        for category in categories {
            for listing_url in &category.listing_urls {
                let worker = self.clone();
                let tx = tx.clone();
                let category = category.name.clone();
                let listing_url = listing_url.clone();

                listings.spawn(async move {
                    worker.process_listing(category, listing_url, tx).await;
                });
            }
        }

        // The collector stops once the last sender is gone
        drop(tx);

        while let Some(joined) = listings.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Listing task failed: {}", e);
            }
        }
    }

    /// Fetches one listing page and fans out over its item links
    async fn process_listing(
        self,
        category: String,
        listing_url: String,
        tx: mpsc::UnboundedSender<SweepEvent>,
    ) {
        let markup = match self.fetch_gated(&listing_url).await {
            Ok(markup) => markup,
            Err(error) => {
                tracing::warn!("Listing page dropped: {}", error);
                let _ = tx.send(SweepEvent::ListingFailed { category, error });
                return;
            }
        };

        let links = item_links(&markup, &self.selectors, &self.base);
        tracing::debug!(
            "Listing {} ({}) has {} item links",
            listing_url,
            category,
            links.len()
        );
        let _ = tx.send(SweepEvent::ListingFetched {
            category: category.clone(),
            item_links: links.len(),
        });

        let mut items = JoinSet::new();
        for item_url in links {
            let worker = self.clone();
            let tx = tx.clone();
            let category = category.clone();

            items.spawn(async move {
                let event = worker.process_item(category, item_url).await;
                let _ = tx.send(event);
            });
        }

        while let Some(joined) = items.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Item task under {} failed: {}", listing_url, e);
            }
        }
    }

    /// Fetches one item detail page and extracts its record
    async fn process_item(&self, category: String, item_url: String) -> SweepEvent {
        let markup = match self.fetch_gated(&item_url).await {
            Ok(markup) => markup,
            Err(error) => {
                tracing::warn!("Item dropped: {}", error);
                return SweepEvent::ItemFailed {
                    category,
                    failure: ItemFailure::Fetch(error),
                };
            }
        };

        match extract_item_from_markup(&markup, &item_url, &self.selectors) {
            Ok(record) => SweepEvent::ItemExtracted { category, record },
            Err(error) => {
                tracing::warn!("Item dropped: {}", error);
                SweepEvent::ItemFailed {
                    category,
                    failure: ItemFailure::Extraction(error),
                }
            }
        }
    }

    /// Fetches a URL while holding a permit from the shared gate
    async fn fetch_gated(&self, url: &str) -> Result<String, FetchError> {
        let _permit = self.gate.acquire().await.map_err(|_| FetchError {
            url: url.to_string(),
            cause: FetchFailure::Transport("fetch gate closed".to_string()),
        })?;

        self.fetcher.fetch(url).await
    }
}

/// Applies events to the store and report until every sender is dropped
async fn collect(
    mut rx: mpsc::UnboundedReceiver<SweepEvent>,
    mut store: AggregationStore,
    mut report: RunReport,
) -> (AggregationStore, RunReport) {
    while let Some(event) = rx.recv().await {
        apply_event(&mut store, &mut report, event);
    }
    (store, report)
}

fn apply_event(store: &mut AggregationStore, report: &mut RunReport, event: SweepEvent) {
    match event {
        SweepEvent::ListingFetched {
            category,
            item_links,
        } => report.record_listing(&category, item_links),
        SweepEvent::ListingFailed { category, error } => report.record_failure(
            &category,
            &error.url,
            FailureStage::ListingFetch,
            error.cause.to_string(),
        ),
        SweepEvent::ItemExtracted { category, record } => {
            report.record_item(&category);
            store.insert(&category, record);
        }
        SweepEvent::ItemFailed { category, failure } => match failure {
            ItemFailure::Fetch(error) => report.record_failure(
                &category,
                &error.url,
                FailureStage::ItemFetch,
                error.cause.to_string(),
            ),
            ItemFailure::Extraction(error) => report.record_failure(
                &category,
                &error.url,
                FailureStage::ItemExtraction,
                format!("{}: {}", error.field, error.cause),
            ),
        },
    }
}
