//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl loop end-to-end: robots.txt, politeness, fetching, extraction,
//! persistence and checkpointing.

use async_trait::async_trait;
use corpus_crawler::config::{CategorySeeds, CrawlSettings};
use corpus_crawler::crawler::{Coordinator, Sleeper, CONTENT_TOO_SHORT};
use corpus_crawler::document::Document;
use corpus_crawler::frontier::{FrontierEntry, UrlFrontier};
use corpus_crawler::state::RunState;
use corpus_crawler::storage::{
    DocumentStore, SqliteDocumentStore, StorageError, StorageResult, StoreStats,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PARAGRAPH: &str =
    "This paragraph is comfortably longer than fifty characters so it is kept as content.";

/// Records requested sleeps without waiting
#[derive(Default)]
struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    fn recorded(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Store that only counts saves
#[derive(Clone, Default)]
struct CountingStore {
    saves: Arc<AtomicUsize>,
    fail: bool,
}

impl DocumentStore for CountingStore {
    fn save(&mut self, _document: &Document) -> StorageResult<i64> {
        if self.fail {
            return Err(StorageError::Rejected("disk full".to_string()));
        }
        Ok(self.saves.fetch_add(1, Ordering::SeqCst) as i64 + 1)
    }

    fn get_stats(&self) -> StorageResult<StoreStats> {
        Ok(StoreStats::default())
    }

    fn count_for_source(&self, _source_name: &str) -> StorageResult<u64> {
        Ok(self.saves.load(Ordering::SeqCst) as u64)
    }

    fn close(self: Box<Self>) -> StorageResult<()> {
        Ok(())
    }
}

fn settings(seeds: Vec<String>, dir: &TempDir) -> CrawlSettings {
    CrawlSettings {
        name: "mock".to_string(),
        seeds,
        category: None,
        user_agent: "TestBot/1.0 (+https://example.com/bot)".to_string(),
        delay: Duration::ZERO,
        max_pages: 100,
        max_depth: 1,
        min_article_length: 50,
        retry_attempts: 3,
        request_timeout: Duration::from_secs(5),
        checkpoint_interval: 50,
        stats_interval: Duration::from_secs(60),
        checkpoint_path: dir.path().join("crawler_state_mock.json"),
        max_jitter: Duration::ZERO,
    }
}

fn article(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!(
        "<html><head><title>{title}</title></head><body><main><h1>{title}</h1>\
         <p>{PARAGRAPH}</p>{anchors}</main></body></html>"
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

fn open_store(path: &Path) -> Box<SqliteDocumentStore> {
    Box::new(SqliteDocumentStore::new(path).unwrap())
}

fn coordinator(
    settings: CrawlSettings,
    store: Box<dyn DocumentStore>,
    sleeper: Arc<RecordingSleeper>,
) -> Coordinator {
    Coordinator::with_sleeper(settings, store, sleeper).unwrap()
}

#[tokio::test]
async fn test_crawl_until_frontier_exhausted() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("corpus.db");

    mount_page(&server, "/", article("Home", &["/a", "/b"])).await;
    mount_page(&server, "/a", article("Page A", &["/c"])).await;
    mount_page(&server, "/b", article("Page B", &[])).await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let report = coordinator(
        settings(vec![format!("{}/", base)], &dir),
        open_store(&db),
        sleeper,
    )
    .start()
    .await
    .unwrap();

    assert_eq!(report.state, RunState::Exhausted);
    assert_eq!(report.pages_collected, 3);
    assert_eq!(report.pages_processed, 3);
    assert_eq!(report.queue_remaining, 0);

    let store = SqliteDocumentStore::new(&db).unwrap();
    let stats = store.get_stats().unwrap();
    assert_eq!(stats.total_pages, 3);
    assert_eq!(stats.pages_by_source["generic"], 3);
    assert_eq!(store.count_for_source("mock").unwrap(), 3);
}

#[tokio::test]
async fn test_budget_leaves_outlinks_in_checkpoint() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/x",
        article("X", &["/y", &format!("{}/y#frag", base), "/z", "http://elsewhere.test/w"]),
    )
    .await;

    let mut settings = settings(vec![format!("{}/x", base)], &dir);
    settings.max_pages = 1;
    let checkpoint_path = settings.checkpoint_path.clone();

    let report = coordinator(
        settings,
        Box::new(CountingStore::default()),
        Arc::new(RecordingSleeper::default()),
    )
    .start()
    .await
    .unwrap();

    assert_eq!(report.state, RunState::BudgetReached);
    assert_eq!(report.pages_collected, 1);

    let frontier = UrlFrontier::load(&checkpoint_path).unwrap();
    let queued: Vec<FrontierEntry> = frontier.queued().cloned().collect();
    assert_eq!(
        queued,
        vec![
            FrontierEntry {
                url: format!("{}/y", base),
                depth: 1
            },
            FrontierEntry {
                url: format!("{}/z", base),
                depth: 1
            },
        ]
    );
    assert!(frontier.is_visited(&format!("{}/x", base)));
}

#[tokio::test]
async fn test_robots_disallow_skips_fetch() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article("Secret", &[])))
        .expect(0)
        .mount(&server)
        .await;
    mount_page(&server, "/public", article("Public", &[])).await;

    let store = CountingStore::default();
    let saves = Arc::clone(&store.saves);
    let report = coordinator(
        settings(
            vec![format!("{}/private/page", base), format!("{}/public", base)],
            &dir,
        ),
        Box::new(store),
        Arc::new(RecordingSleeper::default()),
    )
    .start()
    .await
    .unwrap();

    assert_eq!(report.pages_disallowed, 1);
    assert_eq!(report.pages_collected, 1);
    assert_eq!(report.pages_failed, 0);
    assert_eq!(saves.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_redirect_to_disallowed_host_is_not_saved() {
    let origin = MockServer::start().await;
    let target = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/private/landing", target.uri()).as_str()),
        )
        .expect(1)
        .mount(&origin)
        .await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"),
        )
        .expect(1)
        .mount(&target)
        .await;
    mount_page(&target, "/private/landing", article("Landing", &[])).await;

    let store = CountingStore::default();
    let saves = Arc::clone(&store.saves);
    let report = coordinator(
        settings(vec![format!("{}/moved", origin.uri())], &dir),
        Box::new(store),
        Arc::new(RecordingSleeper::default()),
    )
    .start()
    .await
    .unwrap();

    assert_eq!(report.pages_disallowed, 1);
    assert_eq!(report.pages_collected, 0);
    assert_eq!(saves.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_category_members_seed_the_frontier() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("list", "categorymembers"))
        .and(query_param("cmtitle", "Category:science"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "query": {"categorymembers": [
                {"pageid": 1, "ns": 0, "title": "physics"},
                {"pageid": 2, "ns": 0, "title": "chemistry"},
                {"pageid": 3, "ns": 0, "title": "geology"}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/wiki/physics", article("Physics", &[])).await;
    mount_page(&server, "/wiki/chemistry", article("Chemistry", &[])).await;
    Mock::given(method("GET"))
        .and(path("/wiki/geology"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut settings = settings(vec![], &dir);
    settings.max_pages = 1;
    settings.category = Some(CategorySeeds {
        api_url: format!("{}/w/api.php", base),
        category: "science".to_string(),
        include_subcategories: false,
    });

    let store = CountingStore::default();
    let report = coordinator(settings, Box::new(store), Arc::new(RecordingSleeper::default()))
        .start()
        .await
        .unwrap();

    // Budget of one page seeds at most two category members
    assert_eq!(report.state, RunState::BudgetReached);
    assert_eq!(report.pages_collected, 1);
    assert_eq!(report.queue_remaining, 1);
    assert_eq!(report.frontier.total_discovered, 2);
}

#[tokio::test]
async fn test_rate_limited_page_is_retried() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "/busy", article("Busy", &[])).await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let report = coordinator(
        settings(vec![format!("{}/busy", base)], &dir),
        Box::new(CountingStore::default()),
        Arc::clone(&sleeper),
    )
    .start()
    .await
    .unwrap();

    assert_eq!(report.pages_collected, 1);
    assert_eq!(report.pages_failed, 0);

    let sleeps = sleeper.recorded();
    assert!(sleeps.contains(&Duration::from_secs(30)));
    assert!(sleeps.contains(&Duration::from_secs(60)));
}

#[tokio::test]
async fn test_rate_limit_exhausts_attempts() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let url = format!("{}/busy", base);

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "/busy", article("Busy", &[])).await;

    let mut settings = settings(vec![url.clone()], &dir);
    settings.retry_attempts = 2;
    let checkpoint_path = settings.checkpoint_path.clone();

    let report = coordinator(
        settings,
        Box::new(CountingStore::default()),
        Arc::new(RecordingSleeper::default()),
    )
    .start()
    .await
    .unwrap();

    assert_eq!(report.pages_collected, 0);
    assert_eq!(report.pages_failed, 1);

    let frontier = UrlFrontier::load(&checkpoint_path).unwrap();
    assert_eq!(
        frontier.failure_reason(&url),
        Some("rate limited after 2 attempts")
    );
}

#[tokio::test]
async fn test_short_content_is_not_saved() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let url = format!("{}/short", base);

    mount_page(&server, "/short", article("Short", &["/next"])).await;

    let mut settings = settings(vec![url.clone()], &dir);
    settings.min_article_length = 1000;
    let checkpoint_path = settings.checkpoint_path.clone();

    let store = CountingStore::default();
    let saves = Arc::clone(&store.saves);
    let report = coordinator(settings, Box::new(store), Arc::new(RecordingSleeper::default()))
        .start()
        .await
        .unwrap();

    assert_eq!(saves.load(Ordering::SeqCst), 0);
    assert_eq!(report.pages_rejected, 1);
    assert_eq!(report.state, RunState::Exhausted);

    let frontier = UrlFrontier::load(&checkpoint_path).unwrap();
    assert_eq!(frontier.failure_reason(&url), Some(CONTENT_TOO_SHORT));
    assert!(!frontier.is_pending(&format!("{}/next", base)));
}

#[tokio::test]
async fn test_save_failure_marks_page_failed() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let url = format!("{}/page", base);

    mount_page(&server, "/page", article("Page", &[])).await;

    let settings = settings(vec![url.clone()], &dir);
    let checkpoint_path = settings.checkpoint_path.clone();
    let store = CountingStore {
        fail: true,
        ..CountingStore::default()
    };

    let report = coordinator(settings, Box::new(store), Arc::new(RecordingSleeper::default()))
        .start()
        .await
        .unwrap();

    assert_eq!(report.pages_failed, 1);
    let frontier = UrlFrontier::load(&checkpoint_path).unwrap();
    assert!(frontier
        .failure_reason(&url)
        .unwrap()
        .starts_with("failed to save to database"));
}

#[tokio::test]
async fn test_not_found_page_is_failed_without_retry() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let url = format!("{}/missing", base);

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings(vec![url.clone()], &dir);
    let checkpoint_path = settings.checkpoint_path.clone();
    let report = coordinator(
        settings,
        Box::new(CountingStore::default()),
        Arc::new(RecordingSleeper::default()),
    )
    .start()
    .await
    .unwrap();

    assert_eq!(report.pages_failed, 1);
    let frontier = UrlFrontier::load(&checkpoint_path).unwrap();
    assert_eq!(frontier.failure_reason(&url), Some("HTTP status 404"));
}

#[tokio::test]
async fn test_resume_continues_from_checkpoint() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("corpus.db");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(article("Home", &["/a", "/b"])),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/a", article("Page A", &[])).await;
    mount_page(&server, "/b", article("Page B", &[])).await;

    let mut first = settings(vec![format!("{}/", base)], &dir);
    first.max_pages = 1;
    let report = coordinator(first, open_store(&db), Arc::new(RecordingSleeper::default()))
        .start()
        .await
        .unwrap();
    assert_eq!(report.state, RunState::BudgetReached);
    assert_eq!(report.queue_remaining, 2);

    let mut second = settings(vec![format!("{}/", base)], &dir);
    second.max_pages = 3;
    let report = coordinator(second, open_store(&db), Arc::new(RecordingSleeper::default()))
        .resume()
        .await
        .unwrap();

    assert_eq!(report.pages_processed, 2);
    assert_eq!(report.pages_collected, 3);
    assert_eq!(report.state, RunState::BudgetReached);

    let store = SqliteDocumentStore::new(&db).unwrap();
    assert_eq!(store.get_stats().unwrap().total_pages, 3);
}

#[tokio::test]
async fn test_resume_without_checkpoint_starts_fresh() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", article("Home", &[])).await;

    let settings = settings(vec![format!("{}/", base)], &dir);
    let checkpoint_path = settings.checkpoint_path.clone();
    let report = coordinator(
        settings,
        Box::new(CountingStore::default()),
        Arc::new(RecordingSleeper::default()),
    )
    .resume()
    .await
    .unwrap();

    assert_eq!(report.pages_collected, 1);
    assert!(checkpoint_path.exists());
}

#[tokio::test]
async fn test_corrupt_checkpoint_starts_fresh() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", article("Home", &[])).await;

    let settings = settings(vec![format!("{}/", base)], &dir);
    std::fs::write(&settings.checkpoint_path, "{not json").unwrap();

    let report = coordinator(
        settings,
        Box::new(CountingStore::default()),
        Arc::new(RecordingSleeper::default()),
    )
    .resume()
    .await
    .unwrap();

    assert_eq!(report.state, RunState::Exhausted);
    assert_eq!(report.pages_collected, 1);
}

#[tokio::test]
async fn test_politeness_waits_between_same_domain_requests() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", article("Home", &["/a"])).await;
    mount_page(&server, "/a", article("Page A", &[])).await;

    let mut settings = settings(vec![format!("{}/", base)], &dir);
    settings.delay = Duration::from_secs(5);

    let sleeper = Arc::new(RecordingSleeper::default());
    let report = coordinator(
        settings,
        Box::new(CountingStore::default()),
        Arc::clone(&sleeper),
    )
    .start()
    .await
    .unwrap();

    assert_eq!(report.pages_collected, 2);
    let sleeps = sleeper.recorded();
    assert_eq!(sleeps.len(), 1);
    assert!(sleeps[0] > Duration::from_secs(4));
    assert!(sleeps[0] <= Duration::from_secs(5));
}
