//! Cache-first fetching against a mock server

use page_harvest::cache::{CacheStore, RefreshTier};
use page_harvest::config::Settings;
use page_harvest::fetch::{
    FetchRequest, FetchResult, Fetcher, HttpSource, RetryDelays, Strategy,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn long_page(title: &str) -> String {
    format!(
        "<html><body><h1>{}</h1><p>{}</p></body></html>",
        title,
        "Plenty of readable content for the minimum length check. ".repeat(8)
    )
}

fn fetcher(dir: &TempDir) -> Fetcher {
    Fetcher::new(
        CacheStore::new(dir.path()),
        Arc::new(HttpSource::new(reqwest::Client::new())),
    )
    .with_delays(RetryDelays {
        fixed: Duration::ZERO,
        jitter: Duration::ZERO,
    })
}

fn request(server: &MockServer, route: &str, retries: u32) -> FetchRequest {
    let settings = Settings {
        retries,
        ..Settings::default()
    };
    let target = Url::parse(&format!("{}{}", server.uri(), route)).unwrap();
    FetchRequest::new(target, Strategy::Plain, &settings, RefreshTier::Daily)
}

#[tokio::test]
async fn test_second_fetch_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string(long_page("Cached")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let fetcher = fetcher(&dir);
    let request = request(&server, "/article", 3);

    let first = fetcher.fetch(&request).await.into_document().unwrap();
    assert!(!first.from_cache);
    assert!(first.body.contains("<h1>Cached</h1>"));
    assert!(dir.path().join(&request.cache_path).exists());

    let second = fetcher.fetch(&request).await.into_document().unwrap();
    assert!(second.from_cache);
    assert_eq!(second.body, first.body);
}

#[tokio::test]
async fn test_short_responses_exhaust_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thin"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(50)))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let fetcher = fetcher(&dir);
    let request = request(&server, "/thin", 3);

    let result = fetcher.fetch(&request).await;
    assert!(matches!(result, FetchResult::Exhausted { attempts: 3 }));
    assert!(!dir.path().join(&request.cache_path).exists());
}

#[tokio::test]
async fn test_error_status_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string(long_page("Recovered")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let result = fetcher(&dir).fetch(&request(&server, "/flaky", 2)).await;

    let document = result.into_document().unwrap();
    assert!(document.body.contains("Recovered"));
}

#[tokio::test]
async fn test_scripted_request_without_browser_is_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(long_page("Unused")))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut request = request(&server, "/app", 2);
    request.strategy = Strategy::from_kind(
        page_harvest::config::StrategyKind::Scripted,
        Some("#root"),
    );

    let result = fetcher(&dir).fetch(&request).await;
    assert!(matches!(result, FetchResult::Exhausted { attempts: 2 }));
}
