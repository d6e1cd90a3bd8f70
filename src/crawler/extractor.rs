//! Item detail extraction
//!
//! Turns an item detail page into an [`ItemRecord`]. Identity and numeric
//! fields are required; the SKU and the attribute list are optional.
//!
//! # Field Rules
//!
//! | Field | Source text | Rule |
//! |-------|-------------|------|
//! | title | `Chair X` | required, trimmed, non-empty |
//! | sku | `SKU1` | optional, `None` when the element is absent or empty |
//! | price | `1000 руб` | required, leading whitespace-separated token as integer |
//! | previous price | `1200 руб` | same as price |
//! | stock | `В наличии: 5` | required, token after the last `:` as integer |
//! | attributes | `Цвет: Красный` | split on the first `": "`; malformed entries are skipped |

use crate::crawler::parser::{Document, SiteSelectors};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Structured result of extracting one item detail page
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(rename = "name")]
    pub title: String,

    #[serde(default)]
    pub sku: Option<String>,

    pub price: u64,

    #[serde(rename = "previousPrice")]
    pub previous_price: u64,

    #[serde(rename = "inStock")]
    pub stock_count: u64,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Fields read from an item detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemField {
    Title,
    Sku,
    Price,
    PreviousPrice,
    Stock,
}

impl fmt::Display for ItemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemField::Title => "title",
            ItemField::Sku => "sku",
            ItemField::Price => "price",
            ItemField::PreviousPrice => "previous price",
            ItemField::Stock => "stock count",
        };
        f.write_str(name)
    }
}

/// Why a field could not be read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionCause {
    #[error("element not found or empty")]
    Missing,

    #[error("expected an integer in '{0}'")]
    NotNumeric(String),

    #[error("expected '<label>:<count>', got '{0}'")]
    MissingDelimiter(String),
}

/// A required field was absent or unparsable on an item page
#[derive(Debug, Clone, Error)]
#[error("cannot extract {field} from {url}: {cause}")]
pub struct ExtractionError {
    pub url: String,
    pub field: ItemField,
    pub cause: ExtractionCause,
}

/// Extracts an item record from a parsed detail page
///
/// # Arguments
///
/// * `doc` - The parsed item detail page
/// * `url` - The page URL, carried into errors
/// * `selectors` - The compiled site selectors
///
/// # Returns
///
/// * `Ok(ItemRecord)` - Every required field was present and well-formed
/// * `Err(ExtractionError)` - The first required field that was not
pub fn extract_item(
    doc: &Document,
    url: &str,
    selectors: &SiteSelectors,
) -> Result<ItemRecord, ExtractionError> {
    let fail = |field: ItemField, cause: ExtractionCause| ExtractionError {
        url: url.to_string(),
        field,
        cause,
    };

    let title = non_empty_text(doc, &selectors.title)
        .ok_or_else(|| fail(ItemField::Title, ExtractionCause::Missing))?;

    let price = non_empty_text(doc, &selectors.price)
        .ok_or(ExtractionCause::Missing)
        .and_then(|text| parse_amount(&text))
        .map_err(|cause| fail(ItemField::Price, cause))?;

    let previous_price = non_empty_text(doc, &selectors.previous_price)
        .ok_or(ExtractionCause::Missing)
        .and_then(|text| parse_amount(&text))
        .map_err(|cause| fail(ItemField::PreviousPrice, cause))?;

    let stock_count = non_empty_text(doc, &selectors.stock)
        .ok_or(ExtractionCause::Missing)
        .and_then(|text| parse_stock(&text))
        .map_err(|cause| fail(ItemField::Stock, cause))?;

    let sku = non_empty_text(doc, &selectors.sku);

    let attributes = parse_attributes(&doc.all_texts(&selectors.description_entry), url);

    Ok(ItemRecord {
        title,
        sku,
        price,
        previous_price,
        stock_count,
        attributes,
    })
}

/// Parses markup and extracts an item record in one step
pub fn extract_item_from_markup(
    markup: &str,
    url: &str,
    selectors: &SiteSelectors,
) -> Result<ItemRecord, ExtractionError> {
    let doc = Document::parse(markup);
    extract_item(&doc, url, selectors)
}

/// Returns the first match's text, treating empty text as absent
fn non_empty_text(doc: &Document, selector: &Selector) -> Option<String> {
    doc.first_text(selector).filter(|text| !text.is_empty())
}

/// Parses a displayed amount such as `1000 руб` into its leading integer
pub fn parse_amount(text: &str) -> Result<u64, ExtractionCause> {
    let token = text
        .split_whitespace()
        .next()
        .ok_or(ExtractionCause::Missing)?;

    token
        .parse::<u64>()
        .map_err(|_| ExtractionCause::NotNumeric(text.to_string()))
}

/// Parses a stock line such as `В наличии: 5` into its trailing integer
pub fn parse_stock(text: &str) -> Result<u64, ExtractionCause> {
    let (_, count) = text
        .rsplit_once(':')
        .ok_or_else(|| ExtractionCause::MissingDelimiter(text.to_string()))?;

    count
        .trim()
        .parse::<u64>()
        .map_err(|_| ExtractionCause::NotNumeric(text.to_string()))
}

/// Builds the attribute map from `key: value` description entries
///
/// Entries without a `": "` delimiter are skipped and logged; later entries
/// overwrite earlier ones with the same key.
pub fn parse_attributes(entries: &[String], url: &str) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();

    for entry in entries {
        match entry.split_once(": ") {
            Some((key, value)) => {
                attributes.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => {
                tracing::warn!("Skipping malformed description entry '{}' on {}", entry, url);
            }
        }
    }

    attributes
}
