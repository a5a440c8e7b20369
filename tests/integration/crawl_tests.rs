//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the remote API and run the full
//! search → followers → follower posts cycle end-to-end against a temporary
//! output directory.

use chrono::Utc;
use serde_json::{json, Value};
use spread_mapper::config::Config;
use spread_mapper::crawler::Coordinator;
use spread_mapper::state::{ClassState, CrawlPhase, EndpointClass};
use spread_mapper::CrawlError;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server, with no pacing delay
fn create_test_config(base_url: &str, output: &Path) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.api.request_timeout_secs = 5;
    config.output.directory = output.to_string_lossy().into_owned();
    config.crawler.pacing_delay_ms = 0;
    config
}

fn targets(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|u| u.to_string()).collect()
}

/// Reads every appended batch from a store file
fn read_batches(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
        .lines()
        .map(|line| serde_json::from_str(line).expect("Each line must be a JSON array"))
        .collect()
}

fn search_body_one_original() -> Value {
    json!({
        "data": [
            {"id": "100", "text": "look at this", "author_id": "A",
             "created_at": "2024-03-01T10:00:00.000Z"},
            {"id": "101", "text": "RT look at this", "author_id": "B",
             "created_at": "2024-03-01T11:00:00.000Z",
             "referenced_tweets": [{"type": "retweeted", "id": "100"}]}
        ],
        "includes": {"users": [
            {"id": "A", "username": "alice", "name": "Alice"},
            {"id": "B", "username": "bob", "name": "Bob"}
        ]},
        "meta": {"result_count": 2}
    })
}

async fn mount_search(server: &MockServer, url: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .and(query_param("query", format!("(url:{})", url).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_followers(server: &MockServer, user_id: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/2/users/{}/followers", user_id).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_posts(server: &MockServer, user_id: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/2/users/{}/tweets", user_id).as_str()))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_url() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("query", "(url:a.com)"))
        .and(query_param("expansions", "author_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body_one_original()))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_followers(
        &mock_server,
        "A",
        json!({
            "data": [
                {"id": "F1", "username": "fan_one", "name": "Fan One"},
                {"id": "F2", "username": "fan_two", "name": "Fan Two"}
            ],
            "meta": {"result_count": 2}
        }),
    )
    .await;

    mount_posts(
        &mock_server,
        "F1",
        ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "1", "text": "first"}, {"id": "2", "text": "second"}],
            "meta": {"result_count": 2}
        })),
    )
    .await;

    mount_posts(
        &mock_server,
        "F2",
        ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "3", "text": "third"}],
            "meta": {"result_count": 1}
        })),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), output.path());
    let mut coordinator = Coordinator::new(config, "test-token").expect("Failed to create coordinator");
    let stats = coordinator
        .run(&targets(&["a.com"]))
        .await
        .expect("Crawl failed");

    assert_eq!(coordinator.phase(), CrawlPhase::Done);
    assert_eq!(stats.urls_searched, 1);
    assert_eq!(stats.original_posts, 1);
    assert_eq!(stats.authors_expanded, 1);
    assert_eq!(stats.followers, 2);
    assert_eq!(stats.follower_posts, 3);
    assert_eq!(stats.throttle_stalls, 0);

    // Only the original post survives, paired with its author
    let search = read_batches(&output.path().join("search").join("0.json"));
    assert_eq!(
        search,
        vec![json!([{
            "post_id": "100",
            "author_id": "A",
            "username": "alice",
            "display_name": "Alice",
            "created_at": "2024-03-01T10:00:00.000Z"
        }])]
    );

    let followers = read_batches(&output.path().join("followers").join("A.json"));
    assert_eq!(
        followers,
        vec![json!([
            {"user_id": "F1", "username": "fan_one"},
            {"user_id": "F2", "username": "fan_two"}
        ])]
    );

    let posts = read_batches(&output.path().join("follower_posts").join("F1.json"));
    assert_eq!(posts, vec![json!([{"text": "first"}, {"text": "second"}])]);

    let posts = read_batches(&output.path().join("follower_posts").join("F2.json"));
    assert_eq!(posts, vec![json!([{"text": "third"}])]);
}

#[tokio::test]
async fn test_zero_followers_still_written() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_search(&mock_server, "a.com", search_body_one_original()).await;
    mount_followers(&mock_server, "A", json!({"meta": {"result_count": 0}})).await;

    let config = create_test_config(&mock_server.uri(), output.path());
    let mut coordinator = Coordinator::new(config, "test-token").unwrap();
    let stats = coordinator.run(&targets(&["a.com"])).await.unwrap();

    assert_eq!(stats.followers, 0);
    let followers = read_batches(&output.path().join("followers").join("A.json"));
    assert_eq!(followers, vec![json!([])]);
    assert!(!output.path().join("follower_posts").exists());
}

#[tokio::test]
async fn test_missing_result_count_skips_write_and_continues() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    // No result_count: zero results, no search file for index 0
    mount_search(&mock_server, "a.com", json!({"meta": {"newest_id": "1"}})).await;
    mount_search(&mock_server, "b.com", search_body_one_original()).await;
    mount_followers(&mock_server, "A", json!({"meta": {"result_count": 0}})).await;

    let config = create_test_config(&mock_server.uri(), output.path());
    let mut coordinator = Coordinator::new(config, "test-token").unwrap();
    let stats = coordinator
        .run(&targets(&["a.com", "b.com"]))
        .await
        .unwrap();

    assert_eq!(stats.urls_searched, 2);
    assert_eq!(stats.original_posts, 1);
    assert!(!output.path().join("search").join("0.json").exists());
    assert!(output.path().join("search").join("1.json").exists());
}

#[tokio::test]
async fn test_missing_post_count_skips_write() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_search(&mock_server, "a.com", search_body_one_original()).await;
    mount_followers(
        &mock_server,
        "A",
        json!({
            "data": [{"id": "F1", "username": "fan_one"}],
            "meta": {"result_count": 1}
        }),
    )
    .await;
    mount_posts(
        &mock_server,
        "F1",
        ResponseTemplate::new(200).set_body_json(json!({"meta": {}})),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), output.path());
    let mut coordinator = Coordinator::new(config, "test-token").unwrap();
    let stats = coordinator.run(&targets(&["a.com"])).await.unwrap();

    assert_eq!(stats.follower_posts, 0);
    assert!(!output.path().join("follower_posts").join("F1.json").exists());
}

#[tokio::test]
async fn test_remote_error_halts_run_and_keeps_partial_output() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_search(&mock_server, "a.com", search_body_one_original()).await;
    Mock::given(method("GET"))
        .and(path("/2/users/A/followers"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
        .mount(&mock_server)
        .await;
    // Must never be reached
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .and(query_param("query", "(url:b.com)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"meta": {}})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), output.path());
    let mut coordinator = Coordinator::new(config, "test-token").unwrap();
    let result = coordinator.run(&targets(&["a.com", "b.com"])).await;

    assert!(matches!(result, Err(CrawlError::Remote { status: 429, .. })));
    assert_eq!(
        coordinator.phase(),
        CrawlPhase::ExpandingAuthors { url_index: 0 }
    );
    // The search batch written before the failure is kept
    assert_eq!(
        read_batches(&output.path().join("search").join("0.json")).len(),
        1
    );
}

#[tokio::test]
async fn test_skip_failed_items_continues() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_search(&mock_server, "a.com", search_body_one_original()).await;
    mount_followers(
        &mock_server,
        "A",
        json!({
            "data": [
                {"id": "F1", "username": "fan_one"},
                {"id": "F2", "username": "fan_two"}
            ],
            "meta": {"result_count": 2}
        }),
    )
    .await;
    mount_posts(
        &mock_server,
        "F1",
        ResponseTemplate::new(503).set_body_string("Service Unavailable"),
    )
    .await;
    mount_posts(
        &mock_server,
        "F2",
        ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "9", "text": "still here"}],
            "meta": {"result_count": 1}
        })),
    )
    .await;

    let mut config = create_test_config(&mock_server.uri(), output.path());
    config.crawler.skip_failed_items = true;
    let mut coordinator = Coordinator::new(config, "test-token").unwrap();
    let stats = coordinator.run(&targets(&["a.com"])).await.unwrap();

    assert_eq!(stats.items_skipped, 1);
    assert_eq!(stats.follower_posts, 1);
    assert!(!output.path().join("follower_posts").join("F1.json").exists());
    assert_eq!(
        read_batches(&output.path().join("follower_posts").join("F2.json")),
        vec![json!([{"text": "still here"}])]
    );
}

#[tokio::test]
async fn test_search_error_is_fatal_even_when_skipping() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), output.path());
    config.crawler.skip_failed_items = true;
    let mut coordinator = Coordinator::new(config, "bad-token").unwrap();
    let result = coordinator.run(&targets(&["a.com"])).await;

    assert!(matches!(result, Err(CrawlError::Remote { status: 401, .. })));
}

/// Adds quota headers reporting an exhausted window that resets in 2-3 seconds
fn with_exhausted_quota(template: ResponseTemplate) -> ResponseTemplate {
    let reset = (Utc::now() + chrono::Duration::seconds(2)).timestamp() + 1;
    template
        .insert_header("x-rate-limit-remaining", "0")
        .insert_header("x-rate-limit-reset", reset.to_string().as_str())
}

fn two_followers() -> Value {
    json!({
        "data": [
            {"id": "F1", "username": "fan_one"},
            {"id": "F2", "username": "fan_two"}
        ],
        "meta": {"result_count": 2}
    })
}

#[tokio::test]
async fn test_posts_throttle_on_previous_signal_only() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let posts = |text: &str| {
        with_exhausted_quota(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "1", "text": text}],
            "meta": {"result_count": 1}
        })))
    };

    mount_search(&mock_server, "a.com", search_body_one_original()).await;
    mount_followers(&mock_server, "A", two_followers()).await;
    mount_posts(&mock_server, "F1", posts("one")).await;
    mount_posts(&mock_server, "F2", posts("two")).await;

    let config = create_test_config(&mock_server.uri(), output.path());
    let mut coordinator = Coordinator::new(config, "test-token").unwrap();
    let stats = coordinator.run(&targets(&["a.com"])).await.unwrap();

    // The first posts call has no prior signal; the second waits on the first
    assert_eq!(stats.throttle_stalls, 1);
    assert!(stats.stalled_for > Duration::ZERO);
    assert_eq!(stats.follower_posts, 2);
}

#[tokio::test]
async fn test_search_throttle_on_previous_signal_across_urls() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    for url in ["a.com", "b.com"] {
        Mock::given(method("GET"))
            .and(path("/2/tweets/search/recent"))
            .and(query_param("query", format!("(url:{})", url).as_str()))
            .respond_with(with_exhausted_quota(
                ResponseTemplate::new(200).set_body_json(json!({"meta": {"result_count": 0}})),
            ))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&mock_server.uri(), output.path());
    let mut coordinator = Coordinator::new(config, "test-token").unwrap();
    let stats = coordinator
        .run(&targets(&["a.com", "b.com"]))
        .await
        .unwrap();

    // Only the second search waits, on the signal left by the first
    assert_eq!(stats.urls_searched, 2);
    assert_eq!(stats.throttle_stalls, 1);
    assert!(matches!(
        coordinator.limiter().state(EndpointClass::Search),
        ClassState::HasSignal(signal) if signal.requests_remaining == 0
    ));
}

#[tokio::test]
async fn test_followers_throttle_on_previous_signal_only() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    // Two original posts by different authors, each expanded in turn
    mount_search(
        &mock_server,
        "a.com",
        json!({
            "data": [
                {"id": "100", "text": "one", "author_id": "A"},
                {"id": "101", "text": "two", "author_id": "B"}
            ],
            "includes": {"users": [
                {"id": "A", "username": "alice", "name": "Alice"},
                {"id": "B", "username": "bob", "name": "Bob"}
            ]},
            "meta": {"result_count": 2}
        }),
    )
    .await;
    for author in ["A", "B"] {
        Mock::given(method("GET"))
            .and(path(format!("/2/users/{}/followers", author).as_str()))
            .respond_with(with_exhausted_quota(
                ResponseTemplate::new(200).set_body_json(json!({"meta": {"result_count": 0}})),
            ))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&mock_server.uri(), output.path());
    let mut coordinator = Coordinator::new(config, "test-token").unwrap();
    let stats = coordinator.run(&targets(&["a.com"])).await.unwrap();

    assert_eq!(stats.authors_expanded, 2);
    assert_eq!(stats.throttle_stalls, 1);
}

#[tokio::test]
async fn test_exhausted_search_does_not_block_followers() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(with_exhausted_quota(
            ResponseTemplate::new(200).set_body_json(search_body_one_original()),
        ))
        .mount(&mock_server)
        .await;
    mount_followers(&mock_server, "A", two_followers()).await;
    mount_posts(
        &mock_server,
        "F1",
        ResponseTemplate::new(200).set_body_json(json!({"meta": {"result_count": 0}})),
    )
    .await;
    mount_posts(
        &mock_server,
        "F2",
        ResponseTemplate::new(200).set_body_json(json!({"meta": {"result_count": 0}})),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), output.path());
    let mut coordinator = Coordinator::new(config, "test-token").unwrap();
    let stats = coordinator.run(&targets(&["a.com"])).await.unwrap();

    // The search signal is exhausted, but followers and posts are separate classes
    assert_eq!(stats.throttle_stalls, 0);
    assert_eq!(stats.followers, 2);
    assert!(matches!(
        coordinator.limiter().state(EndpointClass::Search),
        ClassState::HasSignal(_)
    ));
    assert_eq!(
        coordinator.limiter().state(EndpointClass::Followers),
        &ClassState::Unknown
    );
}

#[tokio::test]
async fn test_all_filtered_search_batch_written_empty() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_search(
        &mock_server,
        "a.com",
        json!({
            "data": [{"id": "101", "text": "RT", "author_id": "B",
                      "referenced_tweets": [{"type": "retweeted", "id": "100"}]}],
            "includes": {"users": [{"id": "B", "username": "bob", "name": "Bob"}]},
            "meta": {"result_count": 1}
        }),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), output.path());
    let mut coordinator = Coordinator::new(config, "test-token").unwrap();
    let stats = coordinator.run(&targets(&["a.com"])).await.unwrap();

    assert_eq!(stats.original_posts, 0);
    assert_eq!(
        read_batches(&output.path().join("search").join("0.json")),
        vec![json!([])]
    );
    assert!(!output.path().join("followers").exists());
}
