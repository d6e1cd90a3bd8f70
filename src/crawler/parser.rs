//! HTML document queries and link extraction
//!
//! This module wraps the DOM parser behind a small query surface whose
//! lookups return `Option` instead of panicking on absent nodes, and
//! implements the container-scoped link extraction used for categories,
//! pagination and item links.

use crate::config::SelectorConfig;
use crate::url::resolve_href;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A parsed HTML page
///
/// The underlying DOM is not `Send`, so a document is always parsed, queried
/// and dropped without crossing an `.await`.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses markup into a queryable document
    ///
    /// Parsing is lenient and never fails; malformed markup simply yields
    /// fewer matches.
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Returns the first element matching the selector
    pub fn first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// Returns the trimmed text of the first element matching the selector
    pub fn first_text(&self, selector: &Selector) -> Option<String> {
        self.first(selector).map(|element| element_text(&element))
    }

    /// Returns the trimmed text of every element matching the selector
    pub fn all_texts(&self, selector: &Selector) -> Vec<String> {
        self.html
            .select(selector)
            .map(|element| element_text(&element))
            .collect()
    }
}

/// Collects and trims all text below an element
fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Compiled selectors for every query the sweep performs
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    pub category_container: Selector,
    pub category_link: Selector,
    pub pagination_container: Selector,
    pub pagination_link: Selector,
    pub item_link: Selector,
    pub title: Selector,
    pub sku: Selector,
    pub price: Selector,
    pub previous_price: Selector,
    pub stock: Selector,
    pub description_entry: Selector,
}

impl SiteSelectors {
    /// Compiles the configured selector strings
    ///
    /// # Returns
    ///
    /// * `Ok(SiteSelectors)` - Every selector compiled
    /// * `Err(ConfigError::InvalidSelector)` - The first selector that did not
    pub fn compile(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            category_container: compile_selector(&config.category_container)?,
            category_link: compile_selector(&config.category_link)?,
            pagination_container: compile_selector(&config.pagination_container)?,
            pagination_link: compile_selector(&config.pagination_link)?,
            item_link: compile_selector(&config.item_link)?,
            title: compile_selector(&config.title)?,
            sku: compile_selector(&config.sku)?,
            price: compile_selector(&config.price)?,
            previous_price: compile_selector(&config.previous_price)?,
            stock: compile_selector(&config.stock)?,
            description_entry: compile_selector(&config.description_entry)?,
        })
    }
}

/// Compiles a single CSS selector
pub fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Extracts absolute link URLs from a document
///
/// # Link Extraction Rules
///
/// - With a container selector, only anchors inside the first matching
///   container are considered. A missing container is not an error: the
///   result is empty, since optional blocks such as pagination may be absent.
/// - Without a container selector, the whole document is searched.
/// - Each `href` is resolved against `base`; hrefs that cannot be resolved
///   to an http(s) URL are dropped.
/// - Order follows document order; duplicates are kept.
///
/// # Example
///
/// ```
/// use catalog_sweep::crawler::{compile_selector, extract_links, Document};
/// use url::Url;
///
/// let doc = Document::parse(r#"<div class="nav_menu"><a href="chairs">Chairs</a></div>"#);
/// let base = Url::parse("https://example.com/html/").unwrap();
/// let container = compile_selector("div.nav_menu").unwrap();
/// let link = compile_selector("a").unwrap();
///
/// let links = extract_links(&doc, Some(&container), &link, &base);
/// assert_eq!(links, vec!["https://example.com/html/chairs".to_string()]);
/// ```
pub fn extract_links(
    doc: &Document,
    container: Option<&Selector>,
    link: &Selector,
    base: &Url,
) -> Vec<String> {
    let hrefs: Vec<&str> = match container {
        Some(container_selector) => match doc.first(container_selector) {
            Some(scope) => scope
                .select(link)
                .filter_map(|element| element.value().attr("href"))
                .collect(),
            None => {
                tracing::debug!("Link container not found, treating as empty");
                return Vec::new();
            }
        },
        None => doc
            .html
            .select(link)
            .filter_map(|element| element.value().attr("href"))
            .collect(),
    };

    hrefs
        .into_iter()
        .filter_map(|href| resolve_href(href, base))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/html/index1_page_1.html").unwrap()
    }

    fn selector(s: &str) -> Selector {
        compile_selector(s).unwrap()
    }

    #[test]
    fn test_first_text_trims() {
        let doc = Document::parse(r#"<p id="p_header">  Chair X  </p>"#);
        assert_eq!(
            doc.first_text(&selector("p#p_header")),
            Some("Chair X".to_string())
        );
    }

    #[test]
    fn test_first_text_absent() {
        let doc = Document::parse("<html><body></body></html>");
        assert_eq!(doc.first_text(&selector("p#p_header")), None);
    }

    #[test]
    fn test_first_text_collects_nested_text() {
        let doc = Document::parse(r#"<span id="price">1000 <b>руб</b></span>"#);
        assert_eq!(
            doc.first_text(&selector("span#price")),
            Some("1000 руб".to_string())
        );
    }

    #[test]
    fn test_all_texts_in_document_order() {
        let doc = Document::parse(
            r#"<ul id="description"><li>Цвет: Красный</li><li> Вес: 5 кг </li></ul>"#,
        );
        assert_eq!(
            doc.all_texts(&selector("ul#description li")),
            vec!["Цвет: Красный".to_string(), "Вес: 5 кг".to_string()]
        );
    }

    #[test]
    fn test_extract_links_inside_container_only() {
        let doc = Document::parse(
            r#"
            <a href="outside.html">Outside</a>
            <div class="nav_menu">
                <a href="index1_page_1.html">Watches</a>
                <a href="index2_page_1.html">Phones</a>
                <a href="index3_page_1.html">Mice</a>
            </div>
            "#,
        );
        let links = extract_links(
            &doc,
            Some(&selector("div.nav_menu")),
            &selector("a"),
            &base_url(),
        );
        assert_eq!(
            links,
            vec![
                "https://example.com/html/index1_page_1.html".to_string(),
                "https://example.com/html/index2_page_1.html".to_string(),
                "https://example.com/html/index3_page_1.html".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_links_missing_container_is_empty() {
        let doc = Document::parse(r#"<a href="index1_page_2.html">2</a>"#);
        let links = extract_links(
            &doc,
            Some(&selector("div.pagen")),
            &selector("a"),
            &base_url(),
        );
        assert!(links.is_empty());
    }

    #[test]
    fn test_extract_links_without_container() {
        let doc = Document::parse(
            r#"
            <a class="name_item" href="watch/1/1_1.html">A</a>
            <a class="other" href="watch/1/1_2.html">B</a>
            <a class="name_item" href="watch/1/1_3.html">C</a>
            "#,
        );
        let links = extract_links(&doc, None, &selector("a.name_item"), &base_url());
        assert_eq!(
            links,
            vec![
                "https://example.com/html/watch/1/1_1.html".to_string(),
                "https://example.com/html/watch/1/1_3.html".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_links_skips_unresolvable_and_hrefless() {
        let doc = Document::parse(
            r#"<div class="pagen">
                <a>no href</a>
                <a href="javascript:void(0)">js</a>
                <a href="index1_page_2.html">2</a>
            </div>"#,
        );
        let links = extract_links(
            &doc,
            Some(&selector("div.pagen")),
            &selector("a"),
            &base_url(),
        );
        assert_eq!(
            links,
            vec!["https://example.com/html/index1_page_2.html".to_string()]
        );
    }

    #[test]
    fn test_compile_invalid_selector() {
        let result = compile_selector("div[[");
        assert!(matches!(result, Err(ConfigError::InvalidSelector { .. })));
    }

    #[test]
    fn test_default_selectors_compile() {
        assert!(SiteSelectors::compile(&SelectorConfig::default()).is_ok());
    }
}
