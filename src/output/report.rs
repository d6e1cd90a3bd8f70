//! Run report: per-category counts and recorded failures
//!
//! Every failure the sweep tolerates is recorded here with its URL, so a
//! partially successful run is visible in the final summary.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Stage at which a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureStage {
    /// A listing page could not be fetched
    ListingFetch,
    /// An item detail page could not be fetched
    ItemFetch,
    /// An item detail page was fetched but a required field was unusable
    ItemExtraction,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureStage::ListingFetch => "listing fetch",
            FailureStage::ItemFetch => "item fetch",
            FailureStage::ItemExtraction => "item extraction",
        };
        f.write_str(label)
    }
}

/// One recorded failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub category: String,
    pub url: String,
    pub stage: FailureStage,
    pub message: String,
}

/// Counters for one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryStats {
    /// Listing pages scheduled
    pub listing_pages: u64,
    /// Listing pages that could not be fetched
    pub listing_failures: u64,
    /// Item links found on fetched listing pages
    pub items_found: u64,
    /// Items extracted into the store
    pub items_extracted: u64,
    /// Items whose detail page could not be fetched
    pub item_fetch_failures: u64,
    /// Items whose detail page lacked a required field
    pub item_extraction_failures: u64,
}

impl CategoryStats {
    /// Items dropped for any reason
    pub fn items_failed(&self) -> u64 {
        self.item_fetch_failures + self.item_extraction_failures
    }
}

/// Summary of one sweep
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub categories: BTreeMap<String, CategoryStats>,
    pub failures: Vec<FailureRecord>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    /// Creates an empty report started now
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            categories: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    /// Ensures a category has a counters entry
    pub fn register_category(&mut self, name: &str, listing_pages: usize) {
        self.categories.entry(name.to_string()).or_default().listing_pages +=
            listing_pages as u64;
    }

    fn stats_mut(&mut self, category: &str) -> &mut CategoryStats {
        self.categories.entry(category.to_string()).or_default()
    }

    /// Records a fetched listing page and the number of item links on it
    pub fn record_listing(&mut self, category: &str, item_links: usize) {
        self.stats_mut(category).items_found += item_links as u64;
    }

    /// Records an extracted item
    pub fn record_item(&mut self, category: &str) {
        self.stats_mut(category).items_extracted += 1;
    }

    /// Records a tolerated failure
    pub fn record_failure(
        &mut self,
        category: &str,
        url: &str,
        stage: FailureStage,
        message: impl Into<String>,
    ) {
        let stats = self.stats_mut(category);
        match stage {
            FailureStage::ListingFetch => stats.listing_failures += 1,
            FailureStage::ItemFetch => stats.item_fetch_failures += 1,
            FailureStage::ItemExtraction => stats.item_extraction_failures += 1,
        }

        self.failures.push(FailureRecord {
            category: category.to_string(),
            url: url.to_string(),
            stage,
            message: message.into(),
        });
    }

    /// Marks the report finished now
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration, if finished
    pub fn duration_seconds(&self) -> Option<f64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds() as f64 / 1000.0)
    }

    pub fn total_items(&self) -> u64 {
        self.categories.values().map(|s| s.items_extracted).sum()
    }

    pub fn total_item_failures(&self) -> u64 {
        self.categories.values().map(CategoryStats::items_failed).sum()
    }

    pub fn total_listing_failures(&self) -> u64 {
        self.categories.values().map(|s| s.listing_failures).sum()
    }

    /// Total failures of every stage
    pub fn total_failures(&self) -> u64 {
        self.total_item_failures() + self.total_listing_failures()
    }

    /// Failure count per category
    pub fn failures_by_category(&self) -> BTreeMap<&str, u64> {
        self.categories
            .iter()
            .map(|(name, stats)| (name.as_str(), stats.items_failed() + stats.listing_failures))
            .collect()
    }

    /// Returns the share of found items that were extracted, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.total_items() + self.total_item_failures();
        if attempted == 0 {
            return 0.0;
        }
        (self.total_items() as f64 / attempted as f64) * 100.0
    }

    /// Logs the run summary through tracing
    pub fn log_summary(&self) {
        tracing::info!(
            "Sweep finished: {} items in {} categories, {} item failures, {} listing failures",
            self.total_items(),
            self.categories.len(),
            self.total_item_failures(),
            self.total_listing_failures()
        );

        for (name, stats) in &self.categories {
            if stats.items_failed() > 0 || stats.listing_failures > 0 {
                tracing::warn!(
                    "Category '{}': {} extracted, {} items dropped, {} listing pages failed",
                    name,
                    stats.items_extracted,
                    stats.items_failed(),
                    stats.listing_failures
                );
            }
        }
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &RunReport) {
    println!("=== Sweep Report ===\n");

    println!("Overview:");
    println!("  Categories: {}", report.categories.len());
    println!("  Items extracted: {}", report.total_items());
    println!("  Items dropped: {}", report.total_item_failures());
    println!("  Listing pages failed: {}", report.total_listing_failures());
    if let Some(duration) = report.duration_seconds() {
        println!("  Duration: {:.2}s", duration);
    }
    println!();

    println!("Categories:");
    for (name, stats) in &report.categories {
        println!(
            "  {}: {} extracted / {} found, {} dropped, {}/{} listing pages failed",
            name,
            stats.items_extracted,
            stats.items_found,
            stats.items_failed(),
            stats.listing_failures,
            stats.listing_pages
        );
    }
    println!();

    if !report.failures.is_empty() {
        println!("Failures ({}):", report.failures.len());
        for failure in &report.failures {
            println!(
                "  [{}] {} ({}): {}",
                failure.stage, failure.url, failure.category, failure.message
            );
        }
        println!();
    }

    println!("Success Rate: {:.1}%", report.success_rate());
}
