//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: HttpClient → continuation strategy → items/pages

use clap::Parser;
use pagewalk::cli::{Cli, Runner};
use pagewalk::paging::{ContinuationStrategy, ItemPaged, TokenLocation};
use pagewalk::{Error, HttpClient, HttpRequest};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::Write;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: u64,
    name: String,
}

fn ids(items: &[Value]) -> Vec<u64> {
    items.iter().filter_map(|item| item["id"].as_u64()).collect()
}

/// Three pages under /users, /users/page2, /users/page3 linked by absolute nextLink
async fn mount_linked_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}],
            "nextLink": format!("{}/users/page2", server.uri())
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": 3, "name": "Carol"}],
            "nextLink": format!("{}/users/page3", server.uri())
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/page3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": 4, "name": "Dave"}]
        })))
        .mount(server)
        .await;
}

// ============================================================================
// Next Link
// ============================================================================

#[tokio::test]
async fn test_next_link_walks_all_pages() {
    let mock_server = MockServer::start().await;
    mount_linked_pages(&mock_server).await;

    let client = HttpClient::new().unwrap();
    let request = client.get(&format!("{}/users", mock_server.uri())).unwrap();

    let mut users = ItemPaged::<User>::builder(client, request).build();
    let all = users.collect_all().await.unwrap();

    assert_eq!(
        all.iter().map(|u| (u.id, u.name.as_str())).collect::<Vec<_>>(),
        vec![(1, "Alice"), (2, "Bob"), (3, "Carol"), (4, "Dave")]
    );
    assert!(users.next_item().await.is_none());
}

#[tokio::test]
async fn test_relative_next_link_resolves_against_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": 1}],
            "nextLink": "/api/users?page=2"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": 2}]
        })))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let request = client.get(&format!("{}/api/users", mock_server.uri())).unwrap();

    let mut items = ItemPaged::<Value>::builder(client, request)
        .endpoint(Url::parse(&mock_server.uri()).unwrap())
        .build();

    assert_eq!(ids(&items.collect_all().await.unwrap()), vec![1, 2]);
}

#[tokio::test]
async fn test_next_link_keeps_initial_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": 1}],
            "nextLink": format!("{}/users/page2", mock_server.uri())
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/page2"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [{"id": 2}]})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let request = client
        .get(&format!("{}/users", mock_server.uri()))
        .unwrap()
        .header("x-api-key", "secret")
        .unwrap();

    let mut items = ItemPaged::<Value>::builder(client, request).build();
    assert_eq!(ids(&items.collect_all().await.unwrap()), vec![1, 2]);
}

// ============================================================================
// Request Header
// ============================================================================

#[tokio::test]
async fn test_request_header_strategy_with_header_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/containers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"value": [{"id": 1}, {"id": 2}]}))
                .insert_header("x-ms-continuation", "t2"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/containers"))
        .and(header("x-ms-continuation", "t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [{"id": 3}]})))
        .with_priority(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let request = client
        .get(&format!("{}/containers", mock_server.uri()))
        .unwrap();

    let mut pages = ItemPaged::<Value>::builder(client, request)
        .strategy(ContinuationStrategy::request_header("x-ms-continuation").unwrap())
        .continuation_token_location(TokenLocation::header("x-ms-continuation"))
        .build_pages();

    let first = pages.next_page().await.unwrap().unwrap();
    assert_eq!(ids(&first.items), vec![1, 2]);
    assert_eq!(first.continuation_token.as_deref(), Some("t2"));

    let second = pages.next_page().await.unwrap().unwrap();
    assert_eq!(ids(&second.items), vec![3]);
    assert!(second.is_last());

    assert!(pages.next_page().await.is_none());
    assert_eq!(pages.pages_fetched(), 2);
}

// ============================================================================
// Callback
// ============================================================================

#[tokio::test]
async fn test_callback_strategy_builds_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"records": [{"id": 1}, {"id": 2}]},
            "meta": {"cursor": "c2"}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/records"))
        .and(query_param("cursor", "c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"records": [{"id": 3}]},
            "meta": {"cursor": null}
        })))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    let base = format!("{}/records", mock_server.uri());
    let client = HttpClient::new().unwrap();
    let request = client.get(&base).unwrap();

    let strategy = ContinuationStrategy::callback(move |token| {
        let mut url = Url::parse(&base)?;
        url.query_pairs_mut().append_pair("cursor", token);
        Ok(HttpRequest::new(reqwest::Method::GET, url))
    });

    let mut items = ItemPaged::<Value>::builder(client, request)
        .strategy(strategy)
        .items_location("data.records")
        .continuation_token_location(TokenLocation::body("meta.cursor"))
        .build();

    assert_eq!(ids(&items.collect_all().await.unwrap()), vec![1, 2, 3]);
}

// ============================================================================
// Link Header
// ============================================================================

#[tokio::test]
async fn test_link_header_pagination() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 1}, {"id": 2}]))
                .insert_header(
                    "Link",
                    format!(
                        "<{}/repos?page=2>; rel=\"next\", <{}/repos?page=2>; rel=\"last\"",
                        mock_server.uri(),
                        mock_server.uri()
                    )
                    .as_str(),
                ),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 3}])))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let request = client.get(&format!("{}/repos", mock_server.uri())).unwrap();

    let mut items = ItemPaged::<Value>::builder(client, request)
        .items_location("$")
        .continuation_token_location(TokenLocation::link_header("next"))
        .build();

    assert_eq!(ids(&items.collect_all().await.unwrap()), vec![1, 2, 3]);
}

// ============================================================================
// Failure and Resumption
// ============================================================================

#[tokio::test]
async fn test_failed_page_is_retried_with_same_token() {
    let mock_server = MockServer::start().await;
    let page2 = format!("{}/users/page2", mock_server.uri());

    // First attempt at page 2 fails, the retry succeeds
    Mock::given(method("GET"))
        .and(path("/users/page2"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_linked_pages(&mock_server).await;

    let client = HttpClient::new().unwrap();
    let request = client.get(&format!("{}/users", mock_server.uri())).unwrap();
    let mut items = ItemPaged::<Value>::builder(client, request).build();

    assert_eq!(items.next_item().await.unwrap().unwrap()["id"], 1);
    assert_eq!(items.next_item().await.unwrap().unwrap()["id"], 2);

    let err = items.next_item().await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Fetch { .. }));
    assert_eq!(err.continuation_token(), Some(page2.as_str()));
    assert!(err.is_retryable());
    assert_eq!(items.continuation_token(), Some(page2.as_str()));

    let rest = items.collect_all().await.unwrap();
    assert_eq!(ids(&rest), vec![3, 4]);
}

#[tokio::test]
async fn test_resume_from_error_token_in_new_listing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/page2"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_linked_pages(&mock_server).await;

    let client = HttpClient::new().unwrap();
    let request = client.get(&format!("{}/users", mock_server.uri())).unwrap();

    let mut pages = ItemPaged::<Value>::builder(client.clone(), request.clone()).build_pages();
    assert!(pages.next_page().await.unwrap().is_ok());
    let err = pages.next_page().await.unwrap().unwrap_err();
    let token = err.continuation_token().unwrap().to_string();

    // A fresh listing resumed from the token never asks for page 1 again
    let mut resumed = ItemPaged::<Value>::builder(client, request)
        .continuation_token(token)
        .build();
    assert_eq!(ids(&resumed.collect_all().await.unwrap()), vec![3, 4]);

    let first_page_hits = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/users")
        .count();
    assert_eq!(first_page_hits, 1);
}

#[tokio::test]
async fn test_by_page_from_token_skips_earlier_pages() {
    let mock_server = MockServer::start().await;
    mount_linked_pages(&mock_server).await;

    let client = HttpClient::new().unwrap();
    let request = client.get(&format!("{}/users", mock_server.uri())).unwrap();
    let items = ItemPaged::<Value>::builder(client, request).build();

    let mut pages = items.by_page(Some(format!("{}/users/page3", mock_server.uri())));
    let page = pages.next_page().await.unwrap().unwrap();
    assert_eq!(ids(&page.items), vec![4]);
    assert!(pages.next_page().await.is_none());

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/users/page3");
}

#[tokio::test]
async fn test_first_page_failure_has_no_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let request = client.get(&format!("{}/users", mock_server.uri())).unwrap();
    let mut items = ItemPaged::<Value>::builder(client, request).build();

    let err = items.next_item().await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Fetch { continuation_token: None, .. }));
    assert!(!err.is_retryable());
}

// ============================================================================
// CLI
// ============================================================================

#[tokio::test]
async fn test_cli_items_prints_json_lines() {
    let mock_server = MockServer::start().await;
    mount_linked_pages(&mock_server).await;

    let url = format!("{}/users", mock_server.uri());
    let cli = Cli::try_parse_from(["pagewalk", "items", url.as_str(), "--max-items", "3"]).unwrap();

    let mut out = Vec::new();
    Runner::new(cli).run_to(&mut out).await.unwrap();

    let lines: Vec<Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(ids(&lines), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_cli_pages_with_definition_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/containers"))
        .and(header("x-ms-version", "2024-01-01"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": [{"id": 1}, {"id": 2}]}))
                .insert_header("x-ms-continuation", "t2"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/containers"))
        .and(header("x-ms-continuation", "t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [{"id": 3}]})))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    let mut definition = tempfile::NamedTempFile::new().unwrap();
    write!(
        definition,
        r#"
strategy:
  type: request_header
  header_name: x-ms-continuation
items_path: results
continuation_token:
  type: header
  name: x-ms-continuation
headers:
  x-ms-version: "2024-01-01"
"#
    )
    .unwrap();

    let url = format!("{}/containers", mock_server.uri());
    let cli = Cli::try_parse_from([
        "pagewalk",
        "pages",
        url.as_str(),
        "--definition",
        definition.path().to_str().unwrap(),
    ])
    .unwrap();

    let mut out = Vec::new();
    Runner::new(cli).run_to(&mut out).await.unwrap();

    let lines: Vec<Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(
        lines,
        vec![
            json!({"page": 1, "items": 2, "continuation_token": "t2"}),
            json!({"page": 2, "items": 1, "continuation_token": null}),
        ]
    );
}

#[tokio::test]
async fn test_cli_error_carries_resume_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/page2"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_linked_pages(&mock_server).await;

    let url = format!("{}/users", mock_server.uri());
    let cli = Cli::try_parse_from(["pagewalk", "items", url.as_str()]).unwrap();

    let mut out = Vec::new();
    let err = Runner::new(cli).run_to(&mut out).await.unwrap_err();

    let expected = format!("{}/users/page2", mock_server.uri());
    assert_eq!(err.continuation_token(), Some(expected.as_str()));
    // Items before the failure were still written
    assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
}
