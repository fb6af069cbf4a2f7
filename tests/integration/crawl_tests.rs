//! Resumable crawls and crawl jobs against a mock event site

use chrono::{TimeZone, Utc};
use page_harvest::cache::{CacheStore, RefreshTier};
use page_harvest::config::{JobConfig, Settings, StrategyKind};
use page_harvest::crawler::{
    Coordinator, CrawlProgress, KnownResults, PoliteDelay, ProgressStore, SnapshotArchive,
};
use page_harvest::extract::{EventDetailParser, EventIndexParser};
use page_harvest::fetch::{FetchRequest, Fetcher, HttpSource, RetryDelays, Strategy};
use page_harvest::jobs::{JobContext, JobOutcome, JobRegistry, JobRunner, RunFilter};
use page_harvest::output::JsonFileSink;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILLER: &str = "Doors open an hour early, bring a friend and arrive in good time. ";

fn card(slug: &str, title: &str, category: &str) -> String {
    format!(
        r#"<a class="event-item-link" href="/events/{slug}">
             <div class="event-item-wrapper">
               <div class="event-img-wrapper"><img src="/img/{slug}.jpg"></div>
               <p>{category}</p>
               <div class="event-text"><h2>{title}</h2></div>
             </div>
           </a>"#
    )
}

fn index_page() -> String {
    format!(
        "<html><body><h1>What's on</h1>{}{}{}<footer>{}</footer></body></html>",
        card("a", "Alpha", "Music"),
        card("b", "Bravo", "Music"),
        card("c", "Charlie", "Theatre"),
        FILLER.repeat(3)
    )
}

fn detail_page(title: &str, when: &str) -> String {
    format!(
        r#"<html><head><meta property="og:image" content="/img/{title}-large.jpg"></head>
           <body><h1>{title}</h1><time datetime="{when}">soon</time>
           <div class="entry-content"><p>{}</p></div></body></html>"#,
        FILLER.repeat(4)
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

fn quiet_settings() -> Settings {
    Settings {
        retries: 1,
        delay: 0.0,
        backoff_jitter: 0.0,
        polite_delay: 0.0,
        polite_jitter: 0.0,
        ..Settings::default()
    }
}

fn event_url(server: &MockServer, slug: &str) -> String {
    format!("{}/events/{}", server.uri(), slug)
}

#[tokio::test]
async fn test_interrupted_crawl_resumes_after_checkpoint() {
    let server = MockServer::start().await;
    mount_page(&server, "/events/", index_page(), 1).await;
    mount_page(&server, "/events/a", detail_page("Alpha Live", "2024-05-01T19:00"), 0).await;
    mount_page(&server, "/events/b", detail_page("Bravo Live", "2024-05-02T19:00"), 0).await;
    mount_page(&server, "/events/c", detail_page("Charlie Live", "2024-05-03T19:00"), 1).await;

    let dir = TempDir::new().unwrap();
    let pages_dir = dir.path().join("daily/html/events_pages");
    let settings = quiet_settings();

    // A previous run completed A and B, but only A's snapshot survived
    let a_url = Url::parse(&event_url(&server, "a")).unwrap();
    SnapshotArchive::new(&pages_dir)
        .save(&a_url, &detail_page("Alpha Live", "2024-05-01T19:00"))
        .unwrap();
    ProgressStore::in_dir(&pages_dir)
        .save(CrawlProgress::new(2, 3))
        .unwrap();

    let fetcher = Fetcher::new(
        CacheStore::new(dir.path()),
        Arc::new(HttpSource::new(reqwest::Client::new())),
    )
    .with_delays(RetryDelays {
        fixed: Duration::ZERO,
        jitter: Duration::ZERO,
    });
    let coordinator = Coordinator::new(
        fetcher,
        Arc::new(EventIndexParser),
        Arc::new(EventDetailParser),
        &pages_dir,
        &settings,
        RefreshTier::Daily,
    )
    .with_polite_delay(PoliteDelay {
        base: Duration::ZERO,
        jitter: Duration::ZERO,
    });

    let index = FetchRequest::new(
        Url::parse(&format!("{}/events/", server.uri())).unwrap(),
        Strategy::Plain,
        &settings,
        RefreshTier::Daily,
    );
    let outcome = coordinator
        .run(&index, &KnownResults::new(), false)
        .await
        .unwrap();

    assert_eq!(outcome.stats.discovered, 3);
    assert_eq!(outcome.stats.restored, 1);
    assert_eq!(outcome.stats.fetched, 1);

    let music = outcome.results.get("Music").unwrap();
    assert_eq!(music.len(), 2);
    assert_eq!(music[0]["title"], json!("Alpha Live"));
    assert_eq!(music[0]["start_time"], json!("2024-05-01T19:00"));
    // No snapshot: only what the index card offered
    assert_eq!(music[1]["title"], json!("Bravo"));
    assert!(music[1].get("start_time").is_none());

    let theatre = outcome.results.get("Theatre").unwrap();
    assert_eq!(theatre[0]["title"], json!("Charlie Live"));
    assert!(coordinator
        .snapshots()
        .load(&Url::parse(&event_url(&server, "c")).unwrap())
        .is_some());

    assert_eq!(
        coordinator.progress_store().load(),
        CrawlProgress::new(3, 3)
    );
}

fn crawl_job(server: &MockServer) -> JobConfig {
    JobConfig {
        name: "city-events".to_string(),
        kind: "event-crawl".to_string(),
        url: format!("{}/events/", server.uri()),
        output: "events".to_string(),
        tier: RefreshTier::Daily,
        enabled: true,
        strategy: StrategyKind::Plain,
        wait_selector: None,
        known_results_url: Some(format!("{}/published.json", server.uri())),
        dedupe_known: false,
        active_hours: None,
    }
}

#[tokio::test]
async fn test_crawl_job_writes_merged_results_and_reuses_cache() {
    let server = MockServer::start().await;
    mount_page(&server, "/events/", index_page(), 1).await;
    mount_page(&server, "/events/a", detail_page("Alpha Live", "2024-05-01T19:00"), 1).await;
    mount_page(&server, "/events/b", detail_page("Bravo Live", "2024-05-02T19:00"), 1).await;
    mount_page(&server, "/events/c", detail_page("Charlie Live", "2024-05-03T19:00"), 1).await;

    let published = json!({
        "Music": [
            {"url": event_url(&server, "a"), "title": "Alpha", "ticket_url": "https://tickets.example/a"},
            {"url": event_url(&server, "old"), "title": "Last season"}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/published.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(published))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let context = JobContext::new(quiet_settings(), dir.path()).unwrap();
    let runner = JobRunner::new(
        JobRegistry::with_defaults(),
        context,
        Arc::new(JsonFileSink::new(dir.path())),
    );
    let jobs = vec![crawl_job(&server)];
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    // The second run is served entirely from the cache
    for _ in 0..2 {
        let reports = runner.run_at(&jobs, &RunFilter::default(), now).await;
        assert_eq!(reports.len(), 1);
        assert!(matches!(reports[0].outcome, JobOutcome::Written(_)));
    }

    let written = std::fs::read_to_string(dir.path().join("daily/json/events.json")).unwrap();
    let document: Value = serde_json::from_str(&written).unwrap();
    let results = document["results"].as_array().unwrap();
    assert_eq!(results.len(), 4);

    let alpha = results
        .iter()
        .find(|r| r["url"] == json!(event_url(&server, "a")))
        .unwrap();
    assert_eq!(alpha["title"], json!("Alpha Live"));
    assert_eq!(alpha["ticket_url"], json!("https://tickets.example/a"));
    assert_eq!(alpha["category"], json!("Music"));

    assert!(results
        .iter()
        .any(|r| r["url"] == json!(event_url(&server, "old"))));
    assert!(results.iter().all(|r| r.get("category").is_some()));
}

#[tokio::test]
async fn test_unavailable_index_fails_only_that_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/about", detail_page("About us", "2024-01-01"), 1).await;

    let dir = TempDir::new().unwrap();
    let context = JobContext::new(quiet_settings(), dir.path()).unwrap();
    let runner = JobRunner::new(
        JobRegistry::with_defaults(),
        context,
        Arc::new(JsonFileSink::new(dir.path())),
    );

    let mut crawl = crawl_job(&server);
    crawl.known_results_url = None;
    let page = JobConfig {
        name: "about".to_string(),
        kind: "page".to_string(),
        url: format!("{}/about", server.uri()),
        output: "about".to_string(),
        ..crawl.clone()
    };

    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let reports = runner
        .run_at(&[crawl, page], &RunFilter::default(), now)
        .await;

    assert!(reports[0].is_failure());
    assert!(!dir.path().join("daily/json/events.json").exists());

    assert!(matches!(reports[1].outcome, JobOutcome::Written(_)));
    let about: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("daily/json/about.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(about["title"], json!("About us"));
}
