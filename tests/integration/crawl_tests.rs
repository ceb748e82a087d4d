//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the storefronts and run the
//! full navigation → listing → detail → color page cycle end-to-end.

use catalog_ripple::catalog::DedupScope;
use catalog_ripple::config::{Config, CrawlerConfig, OutputConfig, SiteEntry, UserAgentConfig};
use catalog_ripple::crawler::{crawl, Dispatcher, Step};
use catalog_ripple::output::MemorySink;
use catalog_ripple::{CategoryPath, SiteKind};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling one site at `base_url`
fn create_test_config(kind: SiteKind, base_url: &str, records_path: &str) -> Config {
    let mut site = SiteEntry::new(kind);
    site.base_url = Some(base_url.to_string());

    Config {
        crawler: CrawlerConfig {
            max_concurrent_requests: 4,
            request_timeout_secs: 5,
            max_retries: 0,
            retry_delay_ms: 10,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            records_path: records_path.to_string(),
            summary_path: "./test_summary.md".to_string(),
        },
        sites: vec![site],
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// MarkaVIP store where `Men → Shoes` and `Men → All` both list product X
async fn markavip_store(server: &MockServer) {
    mount(
        server,
        "/",
        r#"<div class="header-nav-wrap"><ul><li>
            <a class="nav-item">Men</a>
            <dl><dd class="fn-bold"><a href="/c/shoes">Shoes</a></dd></dl>
            <dl><dd class="fn-bold"><a href="/c/all">All</a></dd></dl>
        </li></ul></div>"#,
    )
    .await;

    let listing = r#"<ul id="J-pro-list">
        <li data-gid="X"><a href="/p/x.html">Leather sneaker</a></li>
    </ul>"#;
    mount(server, "/c/shoes", listing).await;
    mount(server, "/c/all", listing).await;

    Mock::given(method("GET"))
        .and(path("/p/x.html"))
        .respond_with(html(
            r#"<h1 itemprop="name">Leather sneaker</h1>
            <div class="J-sku-price"><span>SAR 450</span></div>
            <span data-key="Color" data-attrid="red"><a>Red</a></span>
            <div class="J-size-list"><a>42</a><a>43</a></div>
            <span class="stockNum">2</span>"#,
        ))
        .expect(1)
        .mount(server)
        .await;
}

/// Lacoste Turkey store with a two-page listing and per-color pages
async fn lacoste_tr_store(server: &MockServer) {
    mount(
        server,
        "/",
        r#"<ul class="js-navigation navigation-list"><li>
            <a><span>Erkek</span></a>
            <div class="page-sidebar__lists"><div><div><ul>
                <li class="hero"><a href="/erkek-polo">Polo</a></li>
            </ul></div></div></div>
        </li></ul>"#,
    )
    .await;

    // Specific query mocks are mounted before the bare path they share
    Mock::given(method("GET"))
        .and(path("/erkek-polo"))
        .and(query_param("page", "2"))
        .respond_with(html(
            r#"<div class="product-item-box">
                <div class="product-item-wrapper" data-sku="78"></div>
                <a class="product-item-image-link" href="/polo-78"></a>
            </div>
            <div class="pagination"><a>1</a><a>2</a></div>"#,
        ))
        .expect(1)
        .mount(server)
        .await;
    mount(
        server,
        "/erkek-polo",
        r#"<div class="product-item-box">
            <div class="product-item-wrapper" data-sku="77"></div>
            <a class="product-item-image-link" href="/polo-77"></a>
        </div>
        <div class="pagination"><a>1</a><a>2</a></div>"#,
    )
    .await;

    let color_pages = [
        (
            "/polo-77",
            "red",
            r#"<span class="js-variant-color-type">Kırmızı</span>
            <div class="product-detail__thumbnails"><img src="/img/77-red.jpg"></div>
            <a class="variant-sizes__item disabled">S</a>
            <a class="variant-sizes__item">M</a>"#,
        ),
        (
            "/polo-77",
            "blue",
            r#"<span class="js-variant-color-type">Mavi</span>"#,
        ),
        (
            "/polo-78",
            "navy",
            r#"<span class="js-variant-color-type">Lacivert</span>
            <a class="variant-sizes__item">L</a>"#,
        ),
    ];
    for (at, code, body) in color_pages {
        Mock::given(method("GET"))
            .and(path(at))
            .and(query_param("integration_renk", code))
            .respond_with(html(body))
            .mount(server)
            .await;
    }

    mount(
        server,
        "/polo-77",
        r#"<div class="name hidden-xs"><h1>Erkek Polo</h1></div>
        <span class="current-price">1.299,00 TL</span>
        <a class="variant-colors__item" data-value="red"></a>
        <a class="variant-colors__item" data-value="blue"></a>"#,
    )
    .await;
    mount(
        server,
        "/polo-78",
        r#"<div class="name hidden-xs"><h1>Erkek Polo Slim</h1></div>
        <a class="variant-colors__item" data-value="navy"></a>"#,
    )
    .await;
}

#[tokio::test]
async fn test_shared_product_fetched_once() {
    let server = MockServer::start().await;
    markavip_store(&server).await;

    let config = create_test_config(SiteKind::MarkaVip, &server.uri(), "./unused.jsonl");
    let sink = Arc::new(MemorySink::new());
    let stats = Dispatcher::new(&config, sink.clone())
        .expect("Failed to create dispatcher")
        .run()
        .await
        .expect("Crawl failed");

    // Both listings emit a summary for X, under different paths
    let mut paths: Vec<CategoryPath> = sink
        .summaries()
        .into_iter()
        .inspect(|summary| assert_eq!(summary.base_sku, "X"))
        .map(|summary| summary.category_path)
        .collect();
    paths.sort_by_key(|path| path.to_string());
    assert_eq!(
        paths,
        vec![
            CategoryPath::new(["Men", "All"]),
            CategoryPath::new(["Men", "Shoes"]),
        ]
    );

    // ...but the detail page is fetched once
    assert_eq!(stats.directives_for(Step::Detail), 1);
    let products = sink.products();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].variant.identifier, "X-red");
    assert_eq!(products[0].variant.size_infos.len(), 2);
    assert!(products[0].available);

    let site = &stats.sites[&SiteKind::MarkaVip];
    assert_eq!(site.summaries, 2);
    assert_eq!(site.distinct_products, 1);
    assert_eq!(site.detail_fetches_skipped, 1);
    assert_eq!(stats.fetch_failures, 0);
}

#[tokio::test]
async fn test_country_sku_scope_still_dedups_within_market() {
    let server = MockServer::start().await;
    markavip_store(&server).await;

    let mut config = create_test_config(SiteKind::MarkaVip, &server.uri(), "./unused.jsonl");
    config.sites[0].dedup_scope = DedupScope::CountrySku;

    let sink = Arc::new(MemorySink::new());
    let stats = Dispatcher::new(&config, sink.clone())
        .expect("Failed to create dispatcher")
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(sink.summaries().len(), 2);
    assert_eq!(stats.directives_for(Step::Detail), 1);
}

#[tokio::test]
async fn test_color_pages_and_fan_out_pagination() {
    let server = MockServer::start().await;
    lacoste_tr_store(&server).await;

    let config = create_test_config(SiteKind::LacosteTr, &server.uri(), "./unused.jsonl");
    let sink = Arc::new(MemorySink::new());
    let stats = Dispatcher::new(&config, sink.clone())
        .expect("Failed to create dispatcher")
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(stats.directives_for(Step::Navigation), 1);
    assert_eq!(stats.directives_for(Step::Listing), 2);
    assert_eq!(stats.directives_for(Step::Detail), 2);
    assert_eq!(stats.directives_for(Step::ColorPage), 3);
    assert_eq!(stats.fetch_failures, 0);
    // Page 1 and the fanned-out page 2, each requested once
    assert_eq!(stats.sites[&SiteKind::LacosteTr].listing_pages, 2);

    let mut skus: Vec<String> = sink.summaries().into_iter().map(|s| s.base_sku).collect();
    skus.sort();
    assert_eq!(skus, vec!["77", "78"]);

    let products = sink.products();
    assert_eq!(products.len(), 3);

    let red = products
        .iter()
        .find(|p| p.variant.identifier == "77-red")
        .expect("red variant missing");
    assert!(red.available);
    assert_eq!(red.variant.color_name, "Kırmızı");
    assert_eq!(red.title.as_deref(), Some("Erkek Polo"));
    assert_eq!(red.category_path, CategoryPath::new(["Erkek", "Polo"]));
    let sizes: Vec<(&str, u32)> = red
        .variant
        .size_infos
        .iter()
        .map(|size| (size.size_identifier.as_str(), size.stock))
        .collect();
    assert_eq!(sizes, vec![("77-red-S", 0), ("77-red-M", 1)]);

    let blue = products
        .iter()
        .find(|p| p.variant.identifier == "77-blue")
        .expect("blue variant missing");
    // No size list and no sold-out marker on the page
    assert!(blue.available);
    assert!(blue.variant.size_infos.is_empty());
    assert_eq!(blue.variant.color_name, "Mavi");

    assert!(products.iter().any(|p| p.variant.identifier == "78-navy"));
    assert!(products.iter().all(|p| p.currency == "TRY"));
}

#[tokio::test]
async fn test_crawl_writes_json_lines() {
    let server = MockServer::start().await;
    lacoste_tr_store(&server).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let records_path = dir.path().join("records.jsonl");
    let config = create_test_config(
        SiteKind::LacosteTr,
        &server.uri(),
        records_path.to_str().expect("Non-UTF-8 temp path"),
    );

    let stats = crawl(config).await.expect("Crawl failed");

    let content = std::fs::read_to_string(&records_path).expect("Records file missing");
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).expect("Invalid JSON line"))
        .collect();

    let summaries = lines.iter().filter(|v| v["kind"] == "summary").count();
    let products = lines.iter().filter(|v| v["kind"] == "product").count();
    assert_eq!(summaries as u64, stats.total_summaries());
    assert_eq!(products as u64, stats.total_products());
    assert_eq!(summaries, 2);
    assert_eq!(products, 3);

    let red = lines
        .iter()
        .find(|v| v["identifier"] == "77-red")
        .expect("red record missing");
    assert_eq!(red["country_code"], "tr");
    assert_eq!(red["category_path"], serde_json::json!(["Erkek", "Polo"]));
}

#[tokio::test]
async fn test_markavip_detail_images_and_sold_out() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/",
        r#"<div class="header-nav-wrap"><ul><li>
            <a class="nav-item" href="/c/new">New In</a>
        </li></ul></div>"#,
    )
    .await;
    mount(
        &server,
        "/c/new",
        r#"<ul id="J-pro-list">
            <li data-gid="P1"><a href="/p/p1.html">Polo</a></li>
            <li data-gid="P2"><a href="/p/p2.html">Cap</a></li>
        </ul>"#,
    )
    .await;
    mount(
        &server,
        "/p/p1.html",
        r#"<h1 itemprop="name">Polo</h1>
        <span data-key="Color" data-attrid="red"><a>Red</a><img src="https://img.example/r1.jpg_60x60t.jpg"></span>
        <span data-key="Color" data-attrid="blue"><a>Blue</a><img src="https://img.example/b1.jpg_60x60t.jpg"></span>
        <div class="J-size-list"><a>S</a><a>M</a></div>
        <span class="stockNum">5</span>
        <img class="goods-loading" src="https://img.example/g1.jpg_800x800t.jpg">"#,
    )
    .await;
    mount(
        &server,
        "/p/p2.html",
        r#"<h1 itemprop="name">Cap</h1>
        <span data-key="Color" data-attrid="black"><a>Black</a><img src="https://img.example/k1.jpg_60x60t.jpg"></span>
        <img class="goods-loading" src="https://img.example/cap.jpg_800x800t.jpg">
        <div class="J-sold-out">Sold out</div>"#,
    )
    .await;

    let config = create_test_config(SiteKind::MarkaVip, &server.uri(), "./unused.jsonl");
    let sink = Arc::new(MemorySink::new());
    let stats = Dispatcher::new(&config, sink.clone())
        .expect("Failed to create dispatcher")
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(stats.fetch_failures, 0);
    let products = sink.products();
    assert_eq!(products.len(), 3);

    let find = |identifier: &str| {
        products
            .iter()
            .find(|p| p.variant.identifier == identifier)
            .unwrap_or_else(|| panic!("{} missing", identifier))
    };

    // Several swatches: each color keeps its own tagged images
    let red = find("P1-red");
    assert!(red.available);
    assert_eq!(red.variant.image_urls, vec!["https://img.example/r1.jpg"]);
    assert_eq!(red.variant.size_infos[0].stock, 5);
    let blue = find("P1-blue");
    assert_eq!(blue.variant.image_urls, vec!["https://img.example/b1.jpg"]);

    // One swatch: the page's generic images, and the sold-out marker wins
    let black = find("P2-black");
    assert_eq!(black.variant.image_urls, vec!["https://img.example/cap.jpg"]);
    assert!(!black.available);
    assert_eq!(black.variant.size_infos[0].size_identifier, "P2-black-one_size");
    assert_eq!(black.variant.size_infos[0].stock, 0);
}

#[tokio::test]
async fn test_unreachable_listing_does_not_stop_crawl() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/",
        r#"<div class="header-nav-wrap"><ul><li>
            <a class="nav-item">Women</a>
            <dl><dd class="fn-bold"><a href="/c/gone">Gone</a></dd></dl>
            <dl><dd class="fn-bold"><a href="/c/bags">Bags</a></dd></dl>
        </li></ul></div>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/c/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount(
        &server,
        "/c/bags",
        r#"<ul id="J-pro-list"><li data-gid="B1"><a href="/p/b1.html">Tote</a></li></ul>"#,
    )
    .await;
    mount(
        &server,
        "/p/b1.html",
        r#"<h1 itemprop="name">Tote</h1>
        <span data-key="Color" data-attrid="tan"><a>Tan</a></span>"#,
    )
    .await;

    let config = create_test_config(SiteKind::MarkaVip, &server.uri(), "./unused.jsonl");
    let sink = Arc::new(MemorySink::new());
    let stats = Dispatcher::new(&config, sink.clone())
        .expect("Failed to create dispatcher")
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(stats.fetch_failures, 1);
    assert_eq!(sink.summaries().len(), 1);

    // No size selector: one size, default stock
    let products = sink.products();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].variant.size_infos[0].size_identifier, "B1-tan-one_size");
}
