//! End-to-end synchronization: register a feed served over HTTP, run update
//! passes, and check what lands in the store.
//!
//! Each test creates its own in-memory SQLite database and mock server.

use std::sync::Arc;

use freshet::config::FetcherConfig;
use freshet::fetcher::{Fetcher, HttpFetcher};
use freshet::store::{SqliteStore, Store};
use freshet::sync::{PassOutcome, UpdateScheduler};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const XKCD_RSS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0">
  <channel>
    <title>xkcd.com</title>
    <link>https://xkcd.com/</link>
    <description>xkcd.com: A webcomic of romance and math humor.</description>
    <item>
      <title>Comic One</title>
      <link>https://xkcd.com/1/</link>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>first</description>
    </item>
    <item>
      <title>Comic Two</title>
      <link>https://xkcd.com/2/</link>
      <pubDate>Tue, 02 Jan 2024 00:00:00 GMT</pubDate>
      <description>second</description>
    </item>
    <item>
      <title>Comic Three</title>
      <link>https://xkcd.com/3/</link>
      <pubDate>Wed, 03 Jan 2024 00:00:00 GMT</pubDate>
      <description>third</description>
    </item>
  </channel>
</rss>"#;

fn setup() -> (Arc<SqliteStore>, Arc<UpdateScheduler<SqliteStore>>) {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let fetcher: Arc<dyn Fetcher + Send + Sync> =
        Arc::new(HttpFetcher::new(&FetcherConfig::default()).unwrap());
    let scheduler = Arc::new(UpdateScheduler::new(store.clone(), fetcher));
    (store, scheduler)
}

async fn serve_rss(server: &MockServer, body: &str, expected_gets: u64) {
    Mock::given(method("GET"))
        .and(path("/rss.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(body),
        )
        .expect(expected_gets)
        .mount(server)
        .await;
}

/// `http://127.0.0.1:PORT` without the scheme, as a user would type it.
fn bare_host(server: &MockServer) -> String {
    server.uri().trim_start_matches("http://").to_string()
}

#[tokio::test]
async fn test_register_then_update_without_duplicates() {
    let server = MockServer::start().await;
    // One GET to register, one per update pass.
    serve_rss(&server, XKCD_RSS, 3).await;
    let (store, scheduler) = setup();

    let feed = scheduler
        .registrar()
        .register_or_get(&format!("{}//rss.xml", bare_host(&server)))
        .await
        .unwrap();

    assert_eq!(feed.url, format!("{}/rss.xml", server.uri()));
    assert_eq!(feed.title.as_deref(), Some("xkcd.com"));
    assert!(store.get_all_entries().unwrap().is_empty());

    let first = scheduler.run_once().await.unwrap();
    let PassOutcome::Completed(first) = first else {
        panic!("first pass skipped");
    };
    assert_eq!(first.feeds, 1);
    assert_eq!(first.inserted, 3);

    let second = scheduler.run_once().await.unwrap();
    let PassOutcome::Completed(second) = second else {
        panic!("second pass skipped");
    };
    assert_eq!(second.inserted, 0);

    let entries = store.get_entries_by_feed(feed.id).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].source_url, "https://xkcd.com/3/");
    assert_eq!(entries[0].title.as_deref(), Some("Comic Three"));
}

#[tokio::test]
async fn test_repeat_registration_is_a_lookup() {
    let server = MockServer::start().await;
    serve_rss(&server, XKCD_RSS, 1).await;
    let (store, scheduler) = setup();

    let url = format!("{}/rss.xml", bare_host(&server));
    let first = scheduler.registrar().register_or_get(&url).await.unwrap();
    let second = scheduler.registrar().register_or_get(&url).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.get_all_feeds().unwrap().len(), 1);
}

#[tokio::test]
async fn test_subscribe_fetches_entries() {
    let server = MockServer::start().await;
    serve_rss(&server, XKCD_RSS, 2).await;
    let (store, scheduler) = setup();

    let (feed, inserted) = scheduler
        .subscribe(&format!("{}/rss.xml", server.uri()))
        .await
        .unwrap();

    assert_eq!(inserted, 3);
    assert_eq!(store.count_entries(feed.id).unwrap(), 3);
}

#[tokio::test]
async fn test_unreachable_feed_surfaces_transient_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (store, scheduler) = setup();

    let err = scheduler
        .registrar()
        .register_or_get(&format!("{}/rss.xml", server.uri()))
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert!(store.get_all_feeds().unwrap().is_empty());
}

#[tokio::test]
async fn test_feed_going_down_does_not_block_others() {
    let healthy = MockServer::start().await;
    serve_rss(&healthy, XKCD_RSS, 2).await;
    let flaky = MockServer::start().await;
    let (store, scheduler) = setup();

    Mock::given(method("GET"))
        .and(path("/rss.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(XKCD_RSS))
        .up_to_n_times(1)
        .mount(&flaky)
        .await;

    scheduler
        .registrar()
        .register_or_get(&format!("{}/rss.xml", healthy.uri()))
        .await
        .unwrap();
    scheduler
        .registrar()
        .register_or_get(&format!("{}/rss.xml", flaky.uri()))
        .await
        .unwrap();

    let PassOutcome::Completed(report) = scheduler.run_once().await.unwrap() else {
        panic!("pass skipped");
    };

    assert_eq!(report.feeds, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(store.get_all_entries().unwrap().len(), 3);
    assert!(!scheduler.is_running());
}
