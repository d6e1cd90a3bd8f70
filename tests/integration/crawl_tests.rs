//! Integration tests for the sweep
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full discovery, fetch and aggregation cycle end-to-end.

use catalog_sweep::config::{Config, CrawlerConfig, OutputConfig, SelectorConfig, SiteConfig};
use catalog_sweep::crawler::sweep;
use catalog_sweep::output::{read_products, write_products, FailureStage};
use catalog_sweep::SweepError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server's seed page
fn create_test_config(base_url: &str, max_concurrent_requests: u32) -> Config {
    Config {
        site: SiteConfig {
            seed_url: format!("{}/index.html", base_url),
            base_url: None,
        },
        selectors: SelectorConfig::default(),
        crawler: CrawlerConfig {
            max_concurrent_requests,
            request_timeout_secs: Some(5),
            user_agent: "TestBot/1.0".to_string(),
        },
        output: OutputConfig::default(),
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn nav(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    format!(r#"<div class="nav_menu">{}</div>"#, anchors)
}

fn pagination(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .enumerate()
        .map(|(i, href)| format!(r#"<a href="{}">{}</a>"#, href, i + 1))
        .collect();
    format!(r#"<div class="pagen">{}</div>"#, anchors)
}

fn listing(items: &[&str]) -> String {
    items
        .iter()
        .map(|href| format!(r#"<a class="name_item" href="{}">item</a>"#, href))
        .collect()
}

fn item_page(title: &str, sku: &str, price: u64, old_price: u64, stock: u64, attrs: &[&str]) -> String {
    let entries: String = attrs.iter().map(|a| format!("<li>{}</li>", a)).collect();
    format!(
        r#"<p id="p_header">{}</p>
           <p class="article">{}</p>
           <span id="price">{} руб</span>
           <span id="old_price">{} руб</span>
           <span id="in_stock">В наличии: {}</span>
           <ul id="description">{}</ul>"#,
        title, sku, price, old_price, stock, entries
    )
}

/// Mounts a catalog with one category, one listing page and two items,
/// the second of which always answers 500
async fn mount_chairs_catalog(server: &MockServer) {
    mount_page(server, "/index.html", &nav(&["/catalog/chairs"])).await;
    mount_page(
        server,
        "/catalog/chairs",
        &pagination(&["/catalog/chairs/page1.html"]),
    )
    .await;
    mount_page(
        server,
        "/catalog/chairs/page1.html",
        &listing(&["/items/a.html", "/items/b.html"]),
    )
    .await;
    mount_page(
        server,
        "/items/a.html",
        &item_page("Chair X", "SKU1", 1000, 1200, 5, &["Цвет: Красный"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/items/b.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sweep_single_category_with_failed_item() {
    let mock_server = MockServer::start().await;
    mount_chairs_catalog(&mock_server).await;

    let config = create_test_config(&mock_server.uri(), 4);
    let outcome = sweep(&config).await.expect("Sweep failed");

    // Only the extracted item is aggregated
    let chairs = outcome.store.get("chairs").expect("chairs category missing");
    assert_eq!(chairs.len(), 1);

    let record = &chairs[0];
    assert_eq!(record.title, "Chair X");
    assert_eq!(record.sku.as_deref(), Some("SKU1"));
    assert_eq!(record.price, 1000);
    assert_eq!(record.previous_price, 1200);
    assert_eq!(record.stock_count, 5);
    assert_eq!(
        record.attributes.get("Цвет").map(String::as_str),
        Some("Красный")
    );

    // The dropped item is counted, not fatal
    let stats = outcome.report.categories["chairs"];
    assert_eq!(stats.listing_pages, 1);
    assert_eq!(stats.items_found, 2);
    assert_eq!(stats.items_extracted, 1);
    assert_eq!(stats.item_fetch_failures, 1);
    assert_eq!(outcome.report.total_failures(), 1);
    assert_eq!(outcome.report.failures[0].stage, FailureStage::ItemFetch);
    assert!(outcome.report.failures[0].url.ends_with("/items/b.html"));
    assert!(outcome.report.finished_at.is_some());
}

#[tokio::test]
async fn test_sweep_is_repeatable() {
    let mock_server = MockServer::start().await;
    mount_chairs_catalog(&mock_server).await;

    let config = create_test_config(&mock_server.uri(), 8);
    let first = sweep(&config).await.expect("First sweep failed");
    let second = sweep(&config).await.expect("Second sweep failed");

    assert!(first.store.same_contents(&second.store));
}

#[tokio::test]
async fn test_sweep_with_single_permit_completes() {
    let mock_server = MockServer::start().await;
    mount_chairs_catalog(&mock_server).await;

    let config = create_test_config(&mock_server.uri(), 1);
    let outcome = sweep(&config).await.expect("Sweep failed");

    assert_eq!(outcome.store.item_count(), 1);
}

#[tokio::test]
async fn test_products_document_round_trip() {
    let mock_server = MockServer::start().await;
    mount_chairs_catalog(&mock_server).await;

    let config = create_test_config(&mock_server.uri(), 4);
    let outcome = sweep(&config).await.expect("Sweep failed");

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let products_path = dir.path().join("products.json");
    write_products(&outcome.store, &products_path).expect("Failed to write products");

    let written = std::fs::read_to_string(&products_path).expect("Failed to read products");
    assert!(written.contains("\"Цвет\": \"Красный\""));
    assert!(written.contains("    \"chairs\": ["));

    let restored = read_products(&products_path).expect("Failed to parse products");
    assert!(restored.same_contents(&outcome.store));
}

#[tokio::test]
async fn test_seed_failure_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 4);
    let result = sweep(&config).await;

    assert!(matches!(result, Err(SweepError::Frontier(_))));
}

#[tokio::test]
async fn test_sweep_multiple_categories_and_pages() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/index.html",
        &nav(&["/catalog/chairs", "/catalog/lamps", "/catalog/rugs"]),
    )
    .await;

    // chairs: two listing pages, one item each
    mount_page(
        &mock_server,
        "/catalog/chairs",
        &pagination(&["/catalog/chairs/page1.html", "/catalog/chairs/page2.html"]),
    )
    .await;
    mount_page(
        &mock_server,
        "/catalog/chairs/page1.html",
        &listing(&["/items/c1.html"]),
    )
    .await;
    mount_page(
        &mock_server,
        "/catalog/chairs/page2.html",
        &listing(&["/items/c2.html"]),
    )
    .await;
    mount_page(
        &mock_server,
        "/items/c1.html",
        &item_page("Chair One", "C1", 100, 150, 3, &[]),
    )
    .await;
    mount_page(
        &mock_server,
        "/items/c2.html",
        &item_page("Chair Two", "C2", 200, 250, 4, &["Материал: Дуб"]),
    )
    .await;

    // lamps: no pagination, so the category page is its only listing page
    mount_page(
        &mock_server,
        "/catalog/lamps",
        &listing(&["/items/l1.html"]),
    )
    .await;
    mount_page(
        &mock_server,
        "/items/l1.html",
        &item_page("Lamp", "L1", 50, 70, 10, &[]),
    )
    .await;

    // rugs: its only listing page fails
    mount_page(
        &mock_server,
        "/catalog/rugs",
        &pagination(&["/catalog/rugs/page1.html"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/catalog/rugs/page1.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 3);
    let outcome = sweep(&config).await.expect("Sweep failed");

    assert_eq!(outcome.store.category_count(), 3);
    assert_eq!(outcome.store.get("chairs").map(|r| r.len()), Some(2));
    assert_eq!(outcome.store.get("lamps").map(|r| r.len()), Some(1));

    // A category with no extracted items is still present, and empty
    assert_eq!(outcome.store.get("rugs").map(|r| r.len()), Some(0));
    assert_eq!(outcome.report.categories["rugs"].listing_failures, 1);
    assert_eq!(outcome.report.total_listing_failures(), 1);

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let products_path = dir.path().join("products.json");
    write_products(&outcome.store, &products_path).expect("Failed to write products");
    let written = std::fs::read_to_string(&products_path).expect("Failed to read products");
    assert!(written.contains("\"rugs\": []"));
}

#[tokio::test]
async fn test_colliding_category_names_are_merged() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/index.html",
        &nav(&["/north/chairs", "/south/chairs"]),
    )
    .await;
    mount_page(&mock_server, "/north/chairs", &listing(&["/items/n.html"])).await;
    mount_page(&mock_server, "/south/chairs", &listing(&["/items/s.html"])).await;
    mount_page(
        &mock_server,
        "/items/n.html",
        &item_page("North Chair", "N1", 10, 20, 1, &[]),
    )
    .await;
    mount_page(
        &mock_server,
        "/items/s.html",
        &item_page("South Chair", "S1", 30, 40, 2, &[]),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), 4);
    let outcome = sweep(&config).await.expect("Sweep failed");

    assert_eq!(outcome.store.category_count(), 1);
    let mut titles: Vec<&str> = outcome
        .store
        .get("chairs")
        .expect("chairs category missing")
        .iter()
        .map(|r| r.title.as_str())
        .collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["North Chair", "South Chair"]);
}

#[tokio::test]
async fn test_extraction_failure_drops_only_that_item() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/index.html", &nav(&["/catalog/desks"])).await;
    mount_page(
        &mock_server,
        "/catalog/desks",
        &listing(&["/items/good.html", "/items/bad.html"]),
    )
    .await;
    mount_page(
        &mock_server,
        "/items/good.html",
        &item_page("Desk", "D1", 500, 600, 2, &[]),
    )
    .await;
    mount_page(
        &mock_server,
        "/items/bad.html",
        r#"<p id="p_header">Broken Desk</p><span id="price">ask us</span>"#,
    )
    .await;

    let config = create_test_config(&mock_server.uri(), 4);
    let outcome = sweep(&config).await.expect("Sweep failed");

    assert_eq!(outcome.store.get("desks").map(|r| r.len()), Some(1));
    assert_eq!(outcome.report.categories["desks"].item_extraction_failures, 1);
    assert_eq!(
        outcome.report.failures[0].stage,
        FailureStage::ItemExtraction
    );
}
