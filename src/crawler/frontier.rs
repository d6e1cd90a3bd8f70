//! Frontier discovery
//!
//! Builds the list of categories and their listing pages before any item is
//! fetched. Discovery is sequential, one request at a time, so the frontier
//! is fully known (and reproducible) before the concurrent phase starts.

use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::parser::{extract_links, Document, SiteSelectors};
use crate::url::{category_name, normalize_url};
use std::collections::{HashMap, HashSet};
use url::Url;

/// A discovered category and its paginated listing pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRef {
    /// Aggregation key, the text after the last `/` of `url`
    pub name: String,

    /// The category page URL
    pub url: String,

    /// Listing pages in discovery order
    pub listing_urls: Vec<String>,
}

/// Sequential discoverer of categories and listing pages
pub struct FrontierBuilder<'a> {
    fetcher: &'a Fetcher,
    selectors: &'a SiteSelectors,
    base: &'a Url,
}

impl<'a> FrontierBuilder<'a> {
    /// Creates a frontier builder
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The shared document fetcher
    /// * `selectors` - Compiled site selectors
    /// * `base` - Base URL relative hrefs are resolved against
    pub fn new(fetcher: &'a Fetcher, selectors: &'a SiteSelectors, base: &'a Url) -> Self {
        Self {
            fetcher,
            selectors,
            base,
        }
    }

    /// Discovers every category reachable from the seed page
    ///
    /// Fetches the seed page, reads the category navigation, then fetches
    /// each category page in turn to read its pagination.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<CategoryRef>)` - Categories in navigation order
    /// * `Err(FetchError)` - The seed or a category page could not be fetched;
    ///   the sweep cannot continue without its frontier
    pub async fn discover_categories(&self, seed_url: &str) -> Result<Vec<CategoryRef>, FetchError> {
        tracing::info!("Discovering categories from {}", seed_url);
        let markup = self.fetcher.fetch(seed_url).await?;
        let category_urls = category_links(&markup, self.selectors, self.base);

        if category_urls.is_empty() {
            tracing::warn!("No categories found on seed page {}", seed_url);
        }

        let mut categories = Vec::with_capacity(category_urls.len());
        let mut seen_names: HashMap<String, String> = HashMap::new();

        for url in category_urls {
            let name = match category_name(&url) {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!("Skipping category link {}: {}", url, e);
                    continue;
                }
            };

            if let Some(previous) = seen_names.insert(name.clone(), url.clone()) {
                tracing::warn!(
                    "Category {} and {} share the key '{}'; their items will be merged",
                    previous,
                    url,
                    name
                );
            }

            let listing_urls = self.discover_listing_pages(&url).await?;
            tracing::debug!(
                "Category '{}' has {} listing page(s)",
                name,
                listing_urls.len()
            );

            categories.push(CategoryRef {
                name,
                url,
                listing_urls,
            });
        }

        tracing::info!(
            "Frontier complete: {} categories, {} listing pages",
            categories.len(),
            categories
                .iter()
                .map(|c| c.listing_urls.len())
                .sum::<usize>()
        );

        Ok(categories)
    }

    /// Discovers the listing pages of one category
    pub async fn discover_listing_pages(&self, category_url: &str) -> Result<Vec<String>, FetchError> {
        let markup = self.fetcher.fetch(category_url).await?;
        Ok(listing_links(&markup, category_url, self.selectors, self.base))
    }
}

/// Reads category URLs from the seed page's navigation block
///
/// Duplicate URLs (after normalization) are dropped, keeping the first.
pub fn category_links(markup: &str, selectors: &SiteSelectors, base: &Url) -> Vec<String> {
    let doc = Document::parse(markup);
    let links = extract_links(
        &doc,
        Some(&selectors.category_container),
        &selectors.category_link,
        base,
    );
    dedupe_urls(links)
}

/// Reads listing page URLs from a category page's pagination block
///
/// A category without pagination is its own single listing page.
pub fn listing_links(
    markup: &str,
    category_url: &str,
    selectors: &SiteSelectors,
    base: &Url,
) -> Vec<String> {
    let doc = Document::parse(markup);
    let links = extract_links(
        &doc,
        Some(&selectors.pagination_container),
        &selectors.pagination_link,
        base,
    );

    if links.is_empty() {
        tracing::debug!(
            "No pagination on {}, using the category page as its only listing",
            category_url
        );
        return vec![category_url.to_string()];
    }

    dedupe_urls(links)
}

/// Reads item detail URLs from a listing page
pub fn item_links(markup: &str, selectors: &SiteSelectors, base: &Url) -> Vec<String> {
    let doc = Document::parse(markup);
    dedupe_urls(extract_links(&doc, None, &selectors.item_link, base))
}

/// Removes URLs equal after normalization, preserving first-seen order
fn dedupe_urls(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();

    urls.into_iter()
        .filter(|url| {
            let key = normalize_url(url)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| url.clone());
            seen.insert(key)
        })
        .collect()
}
