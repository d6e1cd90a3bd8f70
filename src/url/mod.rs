//! URL handling module for Catalog-Sweep
//!
//! This module provides URL normalization, relative link resolution against
//! the catalog base, and derivation of category names from category URLs.

mod normalize;

use crate::{UrlError, UrlResult};
use url::Url;

pub use normalize::normalize_url;

/// Parses an absolute http(s) URL, as required for seed and base URLs
pub fn parse_absolute(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            other
        ))),
    }
}

/// Resolves a link href to an absolute URL against the catalog base
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// # Examples
///
/// ```
/// use catalog_sweep::url::resolve_href;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/html/index1_page_1.html").unwrap();
/// assert_eq!(
///     resolve_href("index2_page_1.html", &base),
///     Some("https://example.com/html/index2_page_1.html".to_string())
/// );
/// ```
pub fn resolve_href(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}

/// Derives the aggregation key of a category from its URL
///
/// The key is everything after the last `/` of the normalized URL, query
/// included, so `.../html/chairs`, `.../html/chairs/` and `.../html/chairs#top`
/// all map to `chairs` while `catalog.php?cat=chairs` and
/// `catalog.php?cat=tables` stay apart. Two categories living under different
/// directories but sharing that trailing text map to the same key and are
/// merged. A URL with nothing after its last `/` (such as the site root) has
/// no key.
///
/// # Examples
///
/// ```
/// use catalog_sweep::url::category_name;
///
/// assert_eq!(category_name("https://example.com/html/chairs").unwrap(), "chairs");
/// assert_eq!(
///     category_name("https://example.com/html/index3_page_1.html?sort=asc").unwrap(),
///     "index3_page_1.html?sort=asc"
/// );
/// ```
pub fn category_name(url_str: &str) -> UrlResult<String> {
    let url = normalize_url(url_str)?;

    match url.as_str().rsplit_once('/') {
        Some((_, tail)) if !tail.is_empty() => Ok(tail.to_string()),
        _ => Err(UrlError::NoCategoryName(url_str.to_string())),
    }
}
