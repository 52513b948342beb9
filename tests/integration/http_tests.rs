//! Full runs with the static HTTP driver
//!
//! These tests use wiremock to serve a listing and item pages and run the
//! pipeline end to end against them.

use crate::fake_driver::{item_html, listing_html};
use catalog_sync::config::Config;
use catalog_sync::pipeline::{MinIntervalGate, Pipeline};
use catalog_sync::render::HttpDriver;
use catalog_sync::storage::{Gateway, RunStatus, SqliteGateway};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration with short real-time waits
fn create_test_config(listing_url: &str, db_path: &Path) -> Config {
    let mut config = Config::default();
    config.catalog.listing_url = listing_url.to_string();
    config.database.path = db_path.to_string_lossy().into_owned();
    config.browser.user_agent = "TestAgent/1.0".to_string();

    let timing = &mut config.timing;
    timing.delay_ms = 0;
    timing.render_grace_ms = 0;
    timing.settle_interval_ms = 10;
    timing.reveal_settle_ms = 0;
    timing.navigation_timeout_ms = 5_000;
    timing.first_render_timeout_ms = 2_000;
    timing.item_timeout_ms = 2_000;
    timing.availability_timeout_ms = 2_000;
    timing.discovery_timeout_ms = 10_000;
    config
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_sync_over_http() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/en/catalog",
        listing_html(&["/product/101", "/product/102", "/product/101", "/product/103"]),
    )
    .await;
    mount_page(
        &server,
        "/product/101",
        item_html(Some("London Dry Gin"), "$32.50", &[("217", "14"), ("45", "2")]),
    )
    .await;
    mount_page(
        &server,
        "/product/102",
        item_html(Some("Spiced Rum"), "$1,299.00", &[("217", "0")]),
    )
    .await;
    // /product/103 is not mounted, so wiremock answers 404

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config = create_test_config(&format!("{}/en/catalog", server.uri()), &db_path);

    let driver = HttpDriver::new(&config.browser.user_agent);
    let gateway = SqliteGateway::new(&db_path).unwrap();
    let limiter = MinIntervalGate::new(config.timing.delay());

    let summary = Pipeline::new(&config, driver, gateway, limiter)
        .with_config_hash("http_test")
        .run()
        .await
        .unwrap();

    assert_eq!(summary.progress.total, 3);
    assert_eq!(summary.progress.succeeded, 2);
    assert_eq!(summary.progress.failed, 1);
    assert_eq!(summary.availability.synced, 3);

    let store = SqliteGateway::new(&db_path).unwrap();
    assert_eq!(store.count_items().unwrap(), 2);
    assert_eq!(store.count_locations().unwrap(), 2);
    assert_eq!(store.count_availability().unwrap(), 3);

    let rum = store.find_item_by_external_id("102").unwrap().unwrap();
    assert_eq!(rum.record.name, "Spiced Rum");
    assert_eq!(rum.record.price_cents, Some(129900));
    assert_eq!(rum.record.category.as_deref(), Some("Spirits"));
    assert!(rum.record.source_url.ends_with("/product/102"));

    let run = store.latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "http_test");
}

#[tokio::test]
async fn test_unreachable_listing_fails_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config = create_test_config(&format!("{}/en/catalog", server.uri()), &db_path);

    let driver = HttpDriver::new(&config.browser.user_agent);
    let gateway = SqliteGateway::new(&db_path).unwrap();
    let limiter = MinIntervalGate::new(config.timing.delay());

    let result = Pipeline::new(&config, driver, gateway, limiter).run().await;
    assert!(result.is_err());

    let store = SqliteGateway::new(&db_path).unwrap();
    assert_eq!(store.latest_run().unwrap().unwrap().status, RunStatus::Failed);
}
