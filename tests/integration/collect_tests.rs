//! Integration tests for the collector
//!
//! These tests use wiremock to stand in for the search API and run full
//! collections against a temporary data directory.

use chrono::NaiveDate;
use post_harvest::collector::{CollectionReport, CollectionRequest, Collector};
use post_harvest::config::{Config, PacingConfig};
use post_harvest::output::write_csv;
use post_harvest::storage::{open_store, store_path, RecordStore, RunStatus};
use serde_json::json;
use std::path::Path;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/twitter/tweet/advanced_search";

/// Creates a test configuration pointing at the mock server with near-zero pacing
fn create_test_config(server: &MockServer, data_dir: &Path) -> Config {
    let mut config = Config::default();
    config.api.endpoint = format!("{}{}", server.uri(), SEARCH_PATH);
    config.pacing = PacingConfig {
        request_timeout: 5_000,
        retry_backoff: 1,
        max_attempts: 5,
        inter_request_delay: 1, // Very short for testing
        inter_window_delay: 1,
        max_pages_per_window: 200,
    };
    config.output.data_dir = data_dir.to_string_lossy().to_string();
    config
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn request(start: NaiveDate, end: NaiveDate) -> CollectionRequest {
    CollectionRequest {
        account: "acct1".to_string(),
        start,
        end,
        api_key: Some("test-key".to_string()),
        recheck: false,
    }
}

fn tweet(id: &str, created_at: &str, likes: u64) -> serde_json::Value {
    json!({
        "id": id,
        "createdAt": created_at,
        "text": format!("post {}", id),
        "retweetCount": 1,
        "replyCount": 2,
        "likeCount": likes,
        "quoteCount": 0,
        "viewCount": 100,
        "bookmarkCount": 0
    })
}

fn last_page(tweets: Vec<serde_json::Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "tweets": tweets,
        "has_next_page": false,
        "next_cursor": ""
    }))
}

/// The `query` parameter of every request the mock server saw, in order
async fn received_queries(server: &MockServer) -> Vec<String> {
    let received = server.received_requests().await.unwrap();
    received
        .iter()
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(k, _)| k == "query")
                .map(|(_, v)| v.into_owned())
        })
        .collect()
}

async fn run_collection(config: Config, req: CollectionRequest) -> CollectionReport {
    let mut collector = Collector::new(config, req, "test-hash").expect("Failed to create collector");
    collector.run().await.expect("Collection failed")
}

#[tokio::test]
async fn test_end_to_end_single_window() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(header("X-API-Key", "test-key"))
        .and(query_param("query", "from:acct1 since:2024-06-01 until:2024-06-15"))
        .and(query_param("queryType", "Latest"))
        .and(query_param("cursor", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tweets": [
                tweet("a", "Mon Jun 10 12:00:00 +0000 2024", 5),
                tweet("b", "Mon Jun 03 09:30:00 +0000 2024", 7)
            ],
            "has_next_page": true,
            "next_cursor": "c1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("cursor", "c1"))
        .respond_with(last_page(vec![tweet("a", "Mon Jun 10 12:00:00 +0000 2024", 5)]))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, dir.path());
    let report = run_collection(config, request(date(2024, 6, 1), date(2024, 6, 15))).await;

    assert_eq!(report.windows_total, 1);
    assert_eq!(report.covered, 1);
    assert_eq!(report.partial, 0);
    assert_eq!(report.new_records, 2);
    assert_eq!(report.total_records, 2);
    assert!(report.uncovered_months.is_empty());

    let store = open_store(dir.path(), "acct1").unwrap();
    let records = store.load_records().unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(records[1].like_count, 7);

    let resume = store.load_resume_state().unwrap();
    assert!(resume.coverage.contains("2024-06"));

    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();

    // First run collects the window
    let first = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(last_page(vec![
            tweet("a", "Mon Jun 10 12:00:00 +0000 2024", 1),
            tweet("b", "Mon Jun 03 09:30:00 +0000 2024", 1),
        ]))
        .mount(&first)
        .await;

    let config = create_test_config(&first, dir.path());
    let report = run_collection(config, request(date(2024, 6, 1), date(2024, 6, 15))).await;
    assert_eq!(report.total_records, 2);

    // Second run must not contact the API at all
    let second = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(last_page(vec![]))
        .expect(0)
        .mount(&second)
        .await;

    let config = create_test_config(&second, dir.path());
    let report = run_collection(config, request(date(2024, 6, 1), date(2024, 6, 15))).await;

    assert_eq!(report.skipped, 1);
    assert_eq!(report.new_records, 0);
    assert_eq!(report.total_records, 2);
}

#[tokio::test]
async fn test_resume_skips_months_covered_by_records() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    // Seed the store with a July post, as an earlier run without a window
    // ledger would have left it
    drop(open_store(dir.path(), "acct1").unwrap());
    let conn = rusqlite::Connection::open(store_path(dir.path(), "acct1")).unwrap();
    conn.execute(
        "INSERT INTO posts (id, created_at, text) VALUES (?1, ?2, ?3)",
        rusqlite::params!["old", "Mon Jul 01 10:00:00 +0000 2024", "from before"],
    )
    .unwrap();
    drop(conn);

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(last_page(vec![]))
        .mount(&server)
        .await;

    let config = create_test_config(&server, dir.path());
    let report = run_collection(config, request(date(2024, 6, 1), date(2024, 9, 1))).await;

    assert_eq!(report.windows_total, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.covered, 2);
    assert_eq!(report.total_records, 1);

    let queries = received_queries(&server).await;
    assert_eq!(
        queries,
        vec![
            "from:acct1 since:2024-08-01 until:2024-09-01".to_string(),
            "from:acct1 since:2024-06-01 until:2024-07-01".to_string(),
        ]
    );
    assert!(queries.iter().all(|q| !q.contains("since:2024-07-01")));
}

#[tokio::test]
async fn test_rate_limit_exhausts_retries_and_leaves_month_uncovered() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(5)
        .mount(&server)
        .await;

    let config = create_test_config(&server, dir.path());
    let report = run_collection(config, request(date(2024, 6, 1), date(2024, 6, 15))).await;

    assert_eq!(report.partial, 1);
    assert_eq!(report.covered, 0);
    assert_eq!(report.uncovered_months, vec!["2024-06".to_string()]);

    let store = open_store(dir.path(), "acct1").unwrap();
    assert!(!store.load_resume_state().unwrap().coverage.contains("2024-06"));
    // Window failures do not fail the run
    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_server_error_keeps_collected_records_and_retries_next_run() {
    let dir = tempfile::tempdir().unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("cursor", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tweets": [tweet("a", "Mon Jun 10 12:00:00 +0000 2024", 1)],
            "has_next_page": true,
            "next_cursor": "c1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("cursor", "c1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, dir.path());
    let report = run_collection(config, request(date(2024, 6, 1), date(2024, 6, 15))).await;

    assert_eq!(report.partial, 1);
    assert_eq!(report.total_records, 1);

    {
        let store = open_store(dir.path(), "acct1").unwrap();
        let resume = store.load_resume_state().unwrap();
        assert!(resume.seen.contains("a"));
        assert!(!resume.coverage.contains("2024-06"));
    }

    // The next run walks June again and can now complete it
    let retry = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(last_page(vec![
            tweet("a", "Mon Jun 10 12:00:00 +0000 2024", 1),
            tweet("b", "Mon Jun 03 09:30:00 +0000 2024", 1),
        ]))
        .expect(1)
        .mount(&retry)
        .await;

    let config = create_test_config(&retry, dir.path());
    let report = run_collection(config, request(date(2024, 6, 1), date(2024, 6, 15))).await;

    assert_eq!(report.covered, 1);
    assert_eq!(report.new_records, 1);
    assert_eq!(report.total_records, 2);
}

#[tokio::test]
async fn test_null_counters_are_stored_as_zero() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(last_page(vec![json!({
            "id": "n1",
            "createdAt": "Mon Jun 10 12:00:00 +0000 2024",
            "text": "counters missing",
            "likeCount": null,
            "viewCount": "42"
        })]))
        .mount(&server)
        .await;

    let config = create_test_config(&server, dir.path());
    run_collection(config, request(date(2024, 6, 1), date(2024, 6, 15))).await;

    let store = open_store(dir.path(), "acct1").unwrap();
    let records = store.load_records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].like_count, 0);
    assert_eq!(records[0].retweet_count, 0);
    assert_eq!(records[0].view_count, 42);

    let mut csv = Vec::new();
    write_csv(&store, &mut csv).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    assert!(csv.contains("n1,Mon Jun 10 12:00:00 +0000 2024,counters missing,0,0,0,0,42,0"));
}

#[tokio::test]
async fn test_stale_running_run_is_marked_interrupted() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let stale_id = {
        let mut store = open_store(dir.path(), "acct1").unwrap();
        store.create_run("acct1", "old-hash").unwrap()
    };

    Mock::given(method("GET"))
        .respond_with(last_page(vec![]))
        .mount(&server)
        .await;

    let config = create_test_config(&server, dir.path());
    run_collection(config, request(date(2024, 6, 1), date(2024, 6, 15))).await;

    let store = open_store(dir.path(), "acct1").unwrap();
    let stale = store.get_run(stale_id).unwrap();
    assert_eq!(stale.status, RunStatus::Interrupted);
    assert!(stale.finished_at.is_some());
}

#[tokio::test]
async fn test_recheck_walks_covered_months_without_duplicating() {
    let dir = tempfile::tempdir().unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(last_page(vec![tweet("a", "Mon Jun 10 12:00:00 +0000 2024", 1)]))
        .expect(2)
        .mount(&server)
        .await;

    let config = create_test_config(&server, dir.path());
    run_collection(config.clone(), request(date(2024, 6, 1), date(2024, 6, 15))).await;

    let mut req = request(date(2024, 6, 1), date(2024, 6, 15));
    req.recheck = true;
    let report = run_collection(config, req).await;

    assert_eq!(report.skipped, 0);
    assert_eq!(report.covered, 1);
    assert_eq!(report.new_records, 0);
    assert_eq!(report.total_records, 1);
}

#[tokio::test]
async fn test_month_split_across_windows_walks_every_window() {
    let dir = tempfile::tempdir().unwrap();

    // 2024-02-24..2024-04-26 plans [03-26, 04-26), [02-26, 03-26) and the
    // clamped [02-24, 02-26); the last two share the 2024-02 key
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(last_page(vec![]))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&server, dir.path());
    let report = run_collection(config, request(date(2024, 2, 24), date(2024, 4, 26))).await;

    assert_eq!(report.windows_total, 3);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.covered, 3);
    assert_eq!(
        received_queries(&server).await,
        vec![
            "from:acct1 since:2024-03-26 until:2024-04-26".to_string(),
            "from:acct1 since:2024-02-26 until:2024-03-26".to_string(),
            "from:acct1 since:2024-02-24 until:2024-02-26".to_string(),
        ]
    );

    let store = open_store(dir.path(), "acct1").unwrap();
    let coverage = store.load_resume_state().unwrap().coverage;
    assert!(coverage.contains("2024-02"));
    assert!(coverage.contains("2024-03"));
}

#[tokio::test]
async fn test_failed_sibling_window_is_walked_again() {
    let dir = tempfile::tempdir().unwrap();

    // The clamped February window fails, its newer sibling drains
    let first = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("query", "from:acct1 since:2024-02-24 until:2024-02-26"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&first)
        .await;
    Mock::given(method("GET"))
        .respond_with(last_page(vec![]))
        .mount(&first)
        .await;

    let config = create_test_config(&first, dir.path());
    let report = run_collection(config, request(date(2024, 2, 24), date(2024, 4, 26))).await;

    assert_eq!(report.covered, 2);
    assert_eq!(report.partial, 1);
    assert_eq!(report.uncovered_months, vec!["2024-02".to_string()]);

    // February is walked again in full, March is skipped
    let second = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(last_page(vec![]))
        .expect(2)
        .mount(&second)
        .await;

    let config = create_test_config(&second, dir.path());
    let report = run_collection(config, request(date(2024, 2, 24), date(2024, 4, 26))).await;

    assert_eq!(report.skipped, 1);
    assert_eq!(report.covered, 2);
    assert_eq!(
        received_queries(&second).await,
        vec![
            "from:acct1 since:2024-02-26 until:2024-03-26".to_string(),
            "from:acct1 since:2024-02-24 until:2024-02-26".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_post_outside_its_window_month_does_not_cover_that_month() {
    let dir = tempfile::tempdir().unwrap();

    // The July window also returns a post created in August
    let first = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(last_page(vec![tweet("aug", "Sat Aug 10 09:00:00 +0000 2024", 1)]))
        .expect(1)
        .mount(&first)
        .await;

    let config = create_test_config(&first, dir.path());
    run_collection(config, request(date(2024, 7, 15), date(2024, 8, 15))).await;

    let second = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(last_page(vec![]))
        .expect(1)
        .mount(&second)
        .await;

    let config = create_test_config(&second, dir.path());
    let report = run_collection(config, request(date(2024, 7, 15), date(2024, 9, 15))).await;

    assert_eq!(report.windows_total, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(
        received_queries(&second).await,
        vec!["from:acct1 since:2024-08-15 until:2024-09-15".to_string()]
    );
}

#[tokio::test]
async fn test_same_identity_in_two_windows_is_stored_once() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(query_param("query", "from:acct1 since:2024-07-01 until:2024-08-01"))
        .respond_with(last_page(vec![tweet("123", "Mon Jul 01 00:00:00 +0000 2024", 4)]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("query", "from:acct1 since:2024-06-01 until:2024-07-01"))
        .respond_with(last_page(vec![
            tweet("123", "Mon Jul 01 00:00:00 +0000 2024", 4),
            tweet("99", "Sun Jun 30 23:00:00 +0000 2024", 1),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, dir.path());
    let report = run_collection(config, request(date(2024, 6, 1), date(2024, 8, 1))).await;

    assert_eq!(report.windows_total, 2);
    assert_eq!(report.covered, 2);
    assert_eq!(report.new_records, 2);
    assert_eq!(report.duplicates, 1);

    let store = open_store(dir.path(), "acct1").unwrap();
    let records = store.load_records().unwrap();
    assert_eq!(records.iter().filter(|r| r.id == "123").count(), 1);
    assert_eq!(records.len(), 2);
}
