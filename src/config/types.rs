use serde::Deserialize;

/// Main configuration structure for Catalog-Sweep
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Target catalog configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Index page holding the category navigation menu
    #[serde(rename = "seed-url", default = "default_seed_url")]
    pub seed_url: String,

    /// Base used to resolve relative hrefs (defaults to the seed URL)
    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,
}

impl SiteConfig {
    /// Returns the URL relative hrefs are resolved against
    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(&self.seed_url)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            seed_url: default_seed_url(),
            base_url: None,
        }
    }
}

/// CSS selectors describing the catalog's markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Container of the category navigation anchors
    #[serde(rename = "category-container")]
    pub category_container: String,

    /// Category anchors inside the navigation container
    #[serde(rename = "category-link")]
    pub category_link: String,

    /// Container of the pagination anchors on a category page
    #[serde(rename = "pagination-container")]
    pub pagination_container: String,

    /// Pagination anchors inside the pagination container
    #[serde(rename = "pagination-link")]
    pub pagination_link: String,

    /// Item detail anchors on a listing page
    #[serde(rename = "item-link")]
    pub item_link: String,

    pub title: String,
    pub sku: String,
    pub price: String,

    #[serde(rename = "previous-price")]
    pub previous_price: String,

    pub stock: String,

    /// Entries of the `key: value` description list
    #[serde(rename = "description-entry")]
    pub description_entry: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            category_container: "div.nav_menu".to_string(),
            category_link: "a[href]".to_string(),
            pagination_container: "div.pagen".to_string(),
            pagination_link: "a[href]".to_string(),
            item_link: "a.name_item[href]".to_string(),
            title: "p#p_header".to_string(),
            sku: "p.article".to_string(),
            price: "span#price".to_string(),
            previous_price: "span#old_price".to_string(),
            stock: "span#in_stock".to_string(),
            description_entry: "ul#description li".to_string(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of page fetches in flight at once
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Per-request timeout in seconds; the transport default applies when unset
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: Option<u64>,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 16,
            request_timeout_secs: None,
            user_agent: format!("CatalogSweep/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the category-grouped products document
    #[serde(rename = "products-path")]
    pub products_path: String,

    /// Path to the markdown run report, if one should be written
    #[serde(rename = "summary-path")]
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            products_path: "products.json".to_string(),
            summary_path: None,
        }
    }
}

fn default_seed_url() -> String {
    "https://parsinger.ru/html/index1_page_1.html".to_string()
}
