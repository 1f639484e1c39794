//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock search, listing and phone
//! endpoints and exercise the fetch pipeline end-to-end.

use moto_harvest::config::{
    Config, EndpointConfig, FilterConfig, HarvesterConfig, HttpConfig, OutputConfig,
};
use moto_harvest::crawler::{run_harvest, Coordinator, PhoneFetcher, RateLimitedClient, RetryPolicy};
use moto_harvest::state::{from_db_timestamp, RunPhase};
use moto_harvest::storage::{SqliteStorage, Storage};
use moto_harvest::{article_id, PageUnitResult};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, db_path: &str) -> Config {
    Config {
        harvester: HarvesterConfig {
            concurrency_limit: 4,
            pages_limit: 500,
            request_timeout_ms: 300,
            max_retries: 1,
            retry_delay_ms: 10,
            max_phone_index: 5,
            inclusive_last_page: false,
        },
        http: HttpConfig::default(),
        endpoints: EndpointConfig {
            search_url: format!("{}/oferty/", base_url),
            phone_url: format!("{}/ajax/phone/", base_url),
            category_id: 29,
        },
        filters: FilterConfig::default(),
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
    }
}

fn test_client(limit: usize, timeout_ms: u64, retries: u32) -> RateLimitedClient {
    RateLimitedClient::new(
        reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap(),
        limit,
        RetryPolicy {
            max_retries: retries,
            delay: Duration::from_millis(10),
        },
    )
}

/// Search result with a pager whose last numbered entry is `last`
fn search_result(last: u32) -> String {
    let items: String = (1..=last)
        .map(|n| format!("<li><a href=\"?page={0}\"><span>{0}</span></a></li>", n))
        .collect();
    format!(
        r#"<html><body><ul class="om-pager rel">{}<li class="next"><a href="?page=2"><span>Następna</span></a></li></ul></body></html>"#,
        items
    )
}

fn listing_block(link: &str) -> String {
    format!(
        r#"<article class="offer-item">
          <div class="offer-item__content">
            <div class="offer-item__title"><h2><a href="{}">Skoda Octavia 1.6 TDI</a></h2></div>
            <ul class="offer-item__params">
              <li data-code="year"><span>2015</span></li>
              <li data-code="mileage"><span>160 000 km</span></li>
              <li data-code="engine_capacity"><span>1 598 cm3</span></li>
              <li data-code="fuel_type"><span>Diesel</span></li>
            </ul>
            <div class="offer-item__price"><div class="offer-price">
              <span class="offer-price__number">39 900 <span class="offer-price__currency">PLN</span></span>
              <span class="offer-price__details">Brutto, Faktura VAT</span>
            </div></div>
            <div class="offer-item__bottom-row"><span class="offer-item__location"><h4>Gdańsk</h4></span></div>
          </div>
        </article>"#,
        link
    )
}

fn listing(sellers: &[&str]) -> String {
    let blocks: String = sellers
        .iter()
        .map(|s| listing_block(&format!("https://www.otomoto.pl/oferta/skoda-ID{}.html#x", s)))
        .collect();
    format!("<html><body>{}</body></html>", blocks)
}

async fn mount_search(server: &MockServer, last_page: u32) {
    Mock::given(method("POST"))
        .and(path("/oferty/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_result(last_page)))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page: u32, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/oferty/"))
        .and(query_param("page", page.to_string().as_str()))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn mount_first_phone(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/ajax/phone/[^/]+/0/$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value": "600 100 200"}"#))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_get_retries_timeouts_then_gives_up() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(4)
        .mount(&server)
        .await;

    let client = test_client(2, 100, 3);
    let response = client.get(&format!("{}/slow", server.uri())).await;

    assert!(response.is_none());
    assert_eq!(client.available_slots(), 2);
}

#[tokio::test]
async fn test_non_200_is_returned_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410).set_body_string("gone"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(1, 500, 3);
    let response = client.get(&format!("{}/gone", server.uri())).await.unwrap();

    assert_eq!(response.status, 410);
    assert!(!response.is_ok());
    assert_eq!(response.body.as_deref(), Some("gone"));
}

#[tokio::test]
async fn test_gate_bounds_concurrency_and_restores_slots() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("ok")
                .set_delay(Duration::from_millis(50)),
        )
        .expect(10)
        .mount(&server)
        .await;

    let client = Arc::new(test_client(3, 2000, 0));
    let url = format!("{}/item", server.uri());
    let started = Instant::now();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let client = Arc::clone(&client);
            let url = url.clone();
            tokio::spawn(async move { client.get(&url).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_ok());
    }

    // 10 requests through 3 slots need at least 4 rounds of 50ms
    assert!(started.elapsed() >= Duration::from_millis(190));
    assert_eq!(client.available_slots(), 3);
}

#[tokio::test]
async fn test_phone_loop_stops_at_first_non_200() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ajax/phone/S1/0/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value": "600 100 200"}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ajax/phone/S1/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value": "+48 22 111 22 33"}"#))
        .mount(&server)
        .await;

    let client = test_client(2, 500, 0);
    let fetcher = PhoneFetcher::new(&client, &format!("{}/ajax/phone", server.uri()), 50);

    let phones = fetcher.fetch("S1").await;
    assert_eq!(phones, vec!["600100200".to_string(), "+48221112233".to_string()]);
}

#[tokio::test]
async fn test_phone_loop_respects_cap() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/ajax/phone/S9/\d+/$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value": "500 500 500"}"#))
        .expect(5)
        .mount(&server)
        .await;

    let client = test_client(2, 500, 0);
    let fetcher = PhoneFetcher::new(&client, &format!("{}/ajax/phone/", server.uri()), 5);

    let phones = fetcher.fetch("S9").await;
    assert_eq!(phones.len(), 5);
    assert!(phones.iter().all(|p| p == "500500500"));
}

#[tokio::test]
async fn test_full_run_with_partial_failure() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    // pager "6" yields pages 1..=5
    mount_search(&server, 6).await;
    for page in [1, 2, 4, 5] {
        let seller = format!("P{}", page);
        mount_page(
            &server,
            page,
            ResponseTemplate::new(200).set_body_string(listing(&[seller.as_str()])),
        )
        .await;
    }
    mount_page(
        &server,
        3,
        ResponseTemplate::new(200)
            .set_body_string(listing(&["P3"]))
            .set_delay(Duration::from_secs(3)),
    )
    .await;
    mount_first_phone(&server).await;

    let mut coordinator = Coordinator::new(create_test_config(&base_url, ":memory:")).unwrap();
    let results = coordinator.run().await.unwrap();

    assert_eq!(coordinator.phase(), RunPhase::Closed);
    assert!(coordinator.client().is_none());
    assert_eq!(results.len(), 5);

    for (index, result) in results.iter().enumerate() {
        let page = index + 1;
        if page == 3 {
            match result {
                PageUnitResult::Failed { url, .. } => assert!(url.ends_with("page=3")),
                other => panic!("page 3 should have failed, got {:?}", other),
            }
            continue;
        }

        let articles = result.articles();
        assert_eq!(articles.len(), 1, "page {}", page);
        let article = &articles[0];
        assert_eq!(article.seller_id, format!("P{}", page));
        assert_eq!(article.manufacturer, "skoda");
        assert_eq!(article.name, "octavia 1.6 tdi");
        assert_eq!(article.engine_type, "diesel");
        assert_eq!(article.year, 2015);
        assert_eq!(article.mileage, 160000);
        assert_eq!(article.engine_capacity, 1.6);
        assert!(article.brutto);
        assert!(article.vat_invoice);
        assert!(!article.link.contains('#'));
        assert_eq!(article.phones, vec!["600100200".to_string()]);
    }
}

#[tokio::test]
async fn test_non_200_page_yields_no_articles() {
    let server = MockServer::start().await;

    mount_search(&server, 3).await;
    mount_page(&server, 1, ResponseTemplate::new(503)).await;
    mount_page(
        &server,
        2,
        ResponseTemplate::new(200).set_body_string(listing(&["OK2"])),
    )
    .await;

    let mut coordinator = Coordinator::new(create_test_config(&server.uri(), ":memory:")).unwrap();
    let results = coordinator.run().await.unwrap();

    assert_eq!(results.len(), 2);
    assert!(!results[0].is_failed());
    assert!(results[0].articles().is_empty());
    assert_eq!(results[1].articles().len(), 1);
}

#[tokio::test]
async fn test_rejected_block_yields_no_entity() {
    let server = MockServer::start().await;

    mount_search(&server, 2).await;
    let body = format!(
        "<html><body>{}</body></html>",
        listing_block("https://www.otomoto.pl/oferta/no-seller.html")
    );
    mount_page(&server, 1, ResponseTemplate::new(200).set_body_string(body)).await;

    let mut coordinator = Coordinator::new(create_test_config(&server.uri(), ":memory:")).unwrap();
    let results = coordinator.run().await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(!results[0].is_failed());
    assert!(results[0].articles().is_empty());
}

#[tokio::test]
async fn test_search_without_pager_visits_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oferty/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Brak ogłoszeń</body></html>"))
        .mount(&server)
        .await;

    let mut coordinator = Coordinator::new(create_test_config(&server.uri(), ":memory:")).unwrap();
    let results = coordinator.run().await.unwrap();

    assert!(results.is_empty());
    assert_eq!(coordinator.phase(), RunPhase::Closed);
}

#[tokio::test]
async fn test_search_post_is_not_retried_on_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oferty/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(search_result(5))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut coordinator = Coordinator::new(create_test_config(&server.uri(), ":memory:")).unwrap();
    let results = coordinator.run().await.unwrap();

    assert!(results.is_empty());
    assert_eq!(coordinator.phase(), RunPhase::Closed);
}

#[tokio::test]
async fn test_pages_limit_truncates_discovery() {
    let server = MockServer::start().await;
    mount_search(&server, 20).await;

    let mut config = create_test_config(&server.uri(), ":memory:");
    config.harvester.pages_limit = 3;

    let mut coordinator = Coordinator::new(config).unwrap();
    let results = coordinator.run().await.unwrap();

    // unmatched listing requests answer 404
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| !r.is_failed() && r.articles().is_empty()));
}

#[tokio::test]
async fn test_duplicates_across_pages_stored_once() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("harvest.db");

    mount_search(&server, 3).await;
    for page in [1, 2] {
        mount_page(
            &server,
            page,
            ResponseTemplate::new(200).set_body_string(listing(&["DUP"])),
        )
        .await;
    }
    mount_first_phone(&server).await;

    let config = create_test_config(&server.uri(), db_path.to_str().unwrap());
    let summary = run_harvest(config).await.unwrap();

    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.duplicates_in_run, 1);
    assert_eq!(summary.failed_units, 0);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_articles().unwrap(), 1);

    let id = article_id("https://www.otomoto.pl/oferta/skoda-IDDUP.html");
    assert_eq!(storage.get_phones(&id).unwrap(), vec!["600100200".to_string()]);

    // a second run finds the article already stored
    let config = create_test_config(&server.uri(), db_path.to_str().unwrap());
    let summary = run_harvest(config).await.unwrap();
    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.already_stored, 1);
}

#[tokio::test]
async fn test_watermark_precedes_inserted_records() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("harvest.db");

    mount_search(&server, 2).await;
    mount_page(
        &server,
        1,
        ResponseTemplate::new(200).set_body_string(listing(&["W1", "W2"])),
    )
    .await;

    let config = create_test_config(&server.uri(), db_path.to_str().unwrap());
    run_harvest(config).await.unwrap();

    let mut storage = SqliteStorage::new(Path::new(&db_path)).unwrap();
    let meta = storage.get_or_create_meta().unwrap();
    assert!(meta.status);
    let last_start = meta.last_start.unwrap();

    for seller in ["W1", "W2"] {
        let id = article_id(&format!("https://www.otomoto.pl/oferta/skoda-ID{}.html", seller));
        let stored = storage.get_article(&id).unwrap().unwrap();
        let created = from_db_timestamp(&stored.record_created).unwrap();
        assert!(last_start < created);
    }
    assert_eq!(storage.count_articles_since(&last_start).unwrap(), 2);
}
