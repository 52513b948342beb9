//! End-to-end pipeline tests against a scripted page driver
//!
//! Time is paused, so settle intervals and rate-limit delays complete instantly.

use crate::fake_driver::{item_html, listing_html, FakeDriver, Heights};
use catalog_sync::catalog::CatalogDiscoverer;
use catalog_sync::config::Config;
use catalog_sync::pipeline::{MinIntervalGate, Pipeline, PipelineState};
use catalog_sync::storage::{Gateway, RunStatus, SqliteGateway};
use catalog_sync::{CatalogError, DiscoveryError, RenderError};
use std::path::Path;
use std::time::Duration;

const LISTING: &str = "https://shop.example.com/en/catalog";

fn item_url(id: u32) -> String {
    format!("https://shop.example.com/product/{}", id)
}

fn test_config(db_path: &Path) -> Config {
    let mut config = Config::default();
    config.catalog.listing_url = LISTING.to_string();
    config.database.path = db_path.to_string_lossy().into_owned();
    config
}

fn limiter(config: &Config) -> MinIntervalGate {
    MinIntervalGate::new(config.timing.delay())
}

#[tokio::test(start_paused = true)]
async fn test_discovery_stops_after_stable_heights() {
    let config = test_config(Path::new("unused.db"));
    let mut driver = FakeDriver::new(LISTING, listing_html(&["/product/1", "/product/2"]))
        .with_heights(Heights::Sequence(vec![100, 250, 400, 400, 400, 400]));

    let urls = CatalogDiscoverer::new(&config)
        .discover_all(&mut driver)
        .await
        .unwrap();

    assert_eq!(urls, vec![item_url(1), item_url(2)]);
    assert_eq!(driver.triggers, 5);
    assert_eq!(driver.height_reads, 6);
}

#[tokio::test(start_paused = true)]
async fn test_discovery_gives_up_on_ever_growing_listing() {
    let mut config = test_config(Path::new("unused.db"));
    config.timing.discovery_timeout_ms = 60_000;

    let mut driver = FakeDriver::new(LISTING, listing_html(&["/product/1"]))
        .with_heights(Heights::Unbounded);

    let result = CatalogDiscoverer::new(&config)
        .discover_all(&mut driver)
        .await;

    match result {
        Err(DiscoveryError::NeverStabilized { elapsed }) => {
            assert!(elapsed >= Duration::from_secs(60));
        }
        other => panic!("expected NeverStabilized, got {:?}", other),
    }
    assert!(driver.triggers > 3);
}

#[tokio::test(start_paused = true)]
async fn test_discovery_dedupes_and_filters_links() {
    let config = test_config(Path::new("unused.db"));
    let mut driver = FakeDriver::new(
        LISTING,
        listing_html(&[
            "/product/1",
            "/product/1",
            "/help/shipping",
            "/product/2",
            "https://shop.example.com/product/1",
        ]),
    );

    let urls = CatalogDiscoverer::new(&config)
        .discover_all(&mut driver)
        .await
        .unwrap();

    assert_eq!(urls, vec![item_url(1), item_url(2)]);
}

#[tokio::test(start_paused = true)]
async fn test_discovery_fails_when_no_item_link_renders() {
    let config = test_config(Path::new("unused.db"));
    let mut driver = FakeDriver::new(LISTING, listing_html(&["/help/shipping"]));

    let result = CatalogDiscoverer::new(&config)
        .discover_all(&mut driver)
        .await;

    assert!(matches!(
        result,
        Err(DiscoveryError::NeverRendered {
            source: RenderError::WaitTimeout { .. },
            ..
        })
    ));
    assert_eq!(driver.triggers, 0);
}

#[tokio::test(start_paused = true)]
async fn test_item_failures_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config = test_config(&db_path);

    let hrefs: Vec<String> = (1..=10).map(|id| format!("/product/{}", id)).collect();
    let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();

    let mut driver = FakeDriver::new(LISTING, listing_html(&href_refs));
    for id in 1..=10 {
        let name = format!("Item {}", id);
        let name = if id == 3 { None } else { Some(name.as_str()) };
        driver = driver.with_page(
            &item_url(id),
            item_html(name, "$24.95", &[("217", "5 in stock"), ("45", "")]),
        );
    }
    driver = driver.with_unreachable(&item_url(7));

    let gateway = SqliteGateway::new(&db_path).unwrap();
    let mut pipeline = Pipeline::new(&config, driver, gateway, limiter(&config))
        .with_config_hash("test_hash");

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.progress.total, 10);
    assert_eq!(summary.progress.succeeded, 8);
    assert_eq!(summary.progress.failed, 2);
    assert_eq!(summary.progress.remaining, 0);
    assert_eq!(summary.availability.synced, 16);
    assert_eq!(summary.availability.failed, 0);
    assert_eq!(pipeline.state(), PipelineState::Done);
    assert_eq!(pipeline.driver().close_calls, 1);

    let store = SqliteGateway::new(&db_path).unwrap();
    assert_eq!(store.count_items().unwrap(), 8);
    assert!(store.find_item_by_external_id("3").unwrap().is_none());
    assert!(store.find_item_by_external_id("7").unwrap().is_none());
    assert_eq!(store.count_locations().unwrap(), 2);
    assert_eq!(store.count_placeholder_locations().unwrap(), 2);
    assert_eq!(store.count_availability().unwrap(), 16);

    let item = store.find_item_by_external_id("1").unwrap().unwrap();
    assert_eq!(item.record.name, "Item 1");
    assert_eq!(item.record.price_cents, Some(2495));
    let location = store.find_location_by_external_id("45").unwrap().unwrap();
    assert_eq!(location.name, "Location 45");
    let stock = store.find_availability(item.id, location.id).unwrap().unwrap();
    assert_eq!(stock.quantity, 0);

    let run = store.latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test_hash");
    assert_eq!(run.totals.succeeded, 8);
    assert_eq!(run.totals.failed, 2);
}

#[tokio::test(start_paused = true)]
async fn test_rerun_updates_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config = test_config(&db_path);

    for (price, quantity) in [("$19.99", "12"), ("$17.49", "3")] {
        let driver = FakeDriver::new(LISTING, listing_html(&["/product/1", "/product/2"]))
            .with_page(&item_url(1), item_html(Some("Gin"), price, &[("217", quantity)]))
            .with_page(&item_url(2), item_html(Some("Rum"), price, &[("217", quantity)]));
        let gateway = SqliteGateway::new(&db_path).unwrap();

        Pipeline::new(&config, driver, gateway, limiter(&config))
            .run()
            .await
            .unwrap();
    }

    let store = SqliteGateway::new(&db_path).unwrap();
    assert_eq!(store.count_items().unwrap(), 2);
    assert_eq!(store.count_locations().unwrap(), 1);
    assert_eq!(store.count_availability().unwrap(), 2);

    let item = store.find_item_by_external_id("1").unwrap().unwrap();
    assert_eq!(item.record.price_cents, Some(1749));
    let location = store.find_location_by_external_id("217").unwrap().unwrap();
    let stock = store.find_availability(item.id, location.id).unwrap().unwrap();
    assert_eq!(stock.quantity, 3);
}

#[tokio::test(start_paused = true)]
async fn test_item_without_availability_control_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config = test_config(&db_path);

    let page = r#"<html><body><div class="product-view">
        <h1 class="product-name">Gift Box</h1>
    </div></body></html>"#;
    let driver =
        FakeDriver::new(LISTING, listing_html(&["/product/5"])).with_page(&item_url(5), page);
    let gateway = SqliteGateway::new(&db_path).unwrap();

    let summary = Pipeline::new(&config, driver, gateway, limiter(&config))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.progress.succeeded, 1);
    assert_eq!(summary.availability.synced, 0);

    let store = SqliteGateway::new(&db_path).unwrap();
    assert_eq!(store.count_items().unwrap(), 1);
    assert_eq!(store.count_availability().unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_reveal_keeps_item_succeeded() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config = test_config(&db_path);

    let driver = FakeDriver::new(LISTING, listing_html(&["/product/8"]))
        .with_page(&item_url(8), item_html(Some("Vodka"), "$29.95", &[("217", "6")]))
        .failing_interact("click: Node is not visible");
    let gateway = SqliteGateway::new(&db_path).unwrap();

    let summary = Pipeline::new(&config, driver, gateway, limiter(&config))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.progress.succeeded, 1);
    assert_eq!(summary.progress.failed, 0);
    assert_eq!(summary.availability.synced, 0);

    let store = SqliteGateway::new(&db_path).unwrap();
    assert_eq!(store.count_items().unwrap(), 1);
    assert_eq!(store.count_availability().unwrap(), 0);
    let run = store.latest_run().unwrap().unwrap();
    assert_eq!(run.totals.succeeded, 1);
    assert_eq!(run.totals.failed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_items_are_spaced_by_delay() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");
    let mut config = test_config(&db_path);
    config.timing.delay_ms = 1000;
    // Keep every other wait out of the measurement
    config.timing.render_grace_ms = 0;
    config.timing.reveal_settle_ms = 0;
    config.timing.settle_interval_ms = 1;

    let mut driver = FakeDriver::new(
        LISTING,
        listing_html(&["/product/1", "/product/2", "/product/3"]),
    );
    for id in 1..=3 {
        driver = driver.with_page(&item_url(id), item_html(Some("Gin"), "$10.00", &[("217", "4")]));
    }
    let gateway = SqliteGateway::new(&db_path).unwrap();

    let started = tokio::time::Instant::now();
    let summary = Pipeline::new(&config, driver, gateway, limiter(&config))
        .run()
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(summary.progress.succeeded, 3);
    assert!(elapsed >= Duration::from_secs(2), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_init_failure_is_fatal_and_drains() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config = test_config(&db_path);

    let driver = FakeDriver::new(LISTING, listing_html(&["/product/1"])).failing_init();
    let gateway = SqliteGateway::new(&db_path).unwrap();
    let mut pipeline = Pipeline::new(&config, driver, gateway, limiter(&config));

    let result = pipeline.run().await;

    assert!(matches!(
        result,
        Err(CatalogError::Render(RenderError::Init(_)))
    ));
    assert_eq!(pipeline.state(), PipelineState::Done);
    assert_eq!(pipeline.driver().close_calls, 1);
    assert!(pipeline.driver().navigations.is_empty());

    let store = SqliteGateway::new(&db_path).unwrap();
    assert_eq!(store.latest_run().unwrap().unwrap().status, RunStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_discovery_failure_is_fatal_and_drains() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config = test_config(&db_path);

    let driver = FakeDriver::new(LISTING, listing_html(&[]));
    let gateway = SqliteGateway::new(&db_path).unwrap();
    let mut pipeline = Pipeline::new(&config, driver, gateway, limiter(&config));

    let result = pipeline.run().await;

    assert!(matches!(
        result,
        Err(CatalogError::Discovery(DiscoveryError::NeverRendered { .. }))
    ));
    assert_eq!(pipeline.driver().init_calls, 1);
    assert_eq!(pipeline.driver().close_calls, 1);
    assert!(matches!(
        pipeline.gateway().count_items(),
        Err(catalog_sync::storage::StorageError::Closed)
    ));

    let store = SqliteGateway::new(&db_path).unwrap();
    let run = store.latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(store.count_items().unwrap(), 0);
}
