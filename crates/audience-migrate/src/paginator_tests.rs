//! Tests for the paginator.

use super::*;
use crate::client::ApiClient;
use crate::config::{ApiEndpoint, Role};
use crate::testing::{page, MockApi};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ==================== PageRequest Tests ====================

#[test]
fn test_page_request_default_size() {
    assert_eq!(PageRequest::default().size(), 100);
    assert!(PageRequest::default().filters().is_empty());
}

#[test]
fn test_page_request_zero_size_rejected() {
    let err = PageRequest::with_size(0).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_page_request_reserved_filters_rejected() {
    assert!(PageRequest::default().filter("page", "3").is_err());
    assert!(PageRequest::default().filter("size", "10").is_err());
}

#[test]
fn test_page_request_query_order() {
    // Arrange
    let request = PageRequest::with_size(25)
        .unwrap()
        .filter("status", "active")
        .unwrap();

    // Act
    let query = request.query(3);

    // Assert
    assert_eq!(
        query,
        vec![
            ("page".to_string(), "3".to_string()),
            ("size".to_string(), "25".to_string()),
            ("status".to_string(), "active".to_string()),
        ]
    );
}

// ==================== Page decoding Tests ====================

#[test]
fn test_page_decode_defaults() {
    let page = Page::decode(json!({"content": [{"name": "A"}]})).unwrap();
    assert_eq!(page.content.len(), 1);
    assert!(!page.last);

    let page = Page::decode(json!({"last": true})).unwrap();
    assert!(page.content.is_empty());
    assert!(page.last);
}

#[test]
fn test_page_decode_empty_is_unusable() {
    assert!(Page::decode(json!(null)).is_err());
    assert!(Page::decode(json!({})).is_err());
    assert!(Page::decode(json!([1, 2])).is_err());
}

#[test]
fn test_page_decode_rejects_non_objects() {
    for body in [json!([]), json!("page"), json!(0), json!(false)] {
        let err = Page::decode(body.clone()).unwrap_err();
        assert!(matches!(err, Error::Decode(_)), "{body} must be unusable");
    }
}

#[test]
fn test_page_decode_null_last_keeps_content() {
    // Act
    let page = Page::decode(json!({"content": [{"name": "A"}], "last": null})).unwrap();

    // Assert
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0]["name"], "A");
    assert!(!page.last);
}

// ==================== fetch_all Tests ====================

#[tokio::test]
async fn test_fetch_all_concatenates_pages_in_order() {
    // Arrange
    let api = MockApi::new()
        .with_page(
            ResourceKind::Audiences,
            page(vec![json!({"name": "A"}), json!({"name": "B"})], false),
        )
        .with_page(ResourceKind::Audiences, page(vec![json!({"name": "C"})], false))
        .with_page(ResourceKind::Audiences, page(vec![json!({"name": "D"})], true));

    // Act
    let records = fetch_all(&api, ResourceKind::Audiences, &PageRequest::default()).await;

    // Assert
    let names: Vec<_> = records.iter().map(|r| r["name"].clone()).collect();
    assert_eq!(names, vec!["A", "B", "C", "D"]);
    assert_eq!(api.list_calls(), 3);
}

#[tokio::test]
async fn test_fetch_all_requests_pages_from_zero() {
    // Arrange
    let api = MockApi::new()
        .with_page(ResourceKind::Templates, page(vec![], false))
        .with_page(ResourceKind::Templates, page(vec![], true));
    let request = PageRequest::with_size(10).unwrap();

    // Act
    fetch_all(&api, ResourceKind::Templates, &request).await;

    // Assert
    let pages: Vec<String> = api.queries().iter().map(|q| q[0].1.clone()).collect();
    assert_eq!(pages, vec!["0", "1"]);
    assert!(api.queries().iter().all(|q| q[1].1 == "10"));
}

#[tokio::test]
async fn test_fetch_all_last_flag_wins_over_content_length() {
    // Arrange: a short first page that is not last, then a full last page.
    let api = MockApi::new()
        .with_page(ResourceKind::Audiences, page(vec![json!({"name": "A"})], false))
        .with_page(ResourceKind::Audiences, page(vec![json!({"name": "B"})], true))
        .with_page(ResourceKind::Audiences, page(vec![json!({"name": "never"})], true));
    let request = PageRequest::with_size(50).unwrap();

    // Act
    let records = fetch_all(&api, ResourceKind::Audiences, &request).await;

    // Assert
    assert_eq!(records.len(), 2);
    assert_eq!(api.list_calls(), 2);
}

#[tokio::test]
async fn test_fetch_all_failure_returns_accumulated() {
    // Arrange
    let api = MockApi::new()
        .with_page(ResourceKind::Connections, page(vec![json!({"name": "A"})], false))
        .with_failing_page(ResourceKind::Connections)
        .with_page(ResourceKind::Connections, page(vec![json!({"name": "B"})], true));

    // Act
    let records = fetch_all(&api, ResourceKind::Connections, &PageRequest::default()).await;

    // Assert
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], "A");
    assert_eq!(api.list_calls(), 2);
}

#[tokio::test]
async fn test_fetch_all_first_page_failure_is_empty() {
    // Arrange
    let api = MockApi::new().with_failing_page(ResourceKind::Templates);

    // Act
    let records = fetch_all(&api, ResourceKind::Templates, &PageRequest::default()).await;

    // Assert
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_fetch_all_stops_on_empty_array_body() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/beta/audience/query"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    let api = ApiClient::new(ApiEndpoint {
        role: Role::Source,
        url: server.uri(),
        api_key: "key".to_string(),
        customer_id: "customer".to_string(),
    })
    .unwrap();

    // Act
    let records = tokio::time::timeout(
        Duration::from_secs(5),
        fetch_all(&api, ResourceKind::Audiences, &PageRequest::default()),
    )
    .await
    .expect("listing must end on an empty array body");

    // Assert
    assert!(records.is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_fetch_all_null_last_continues_to_next_page() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/beta/audience/query"))
        .and(query_param("page", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"content": [{"name": "A"}], "last": null})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/beta/audience/query"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"content": [{"name": "B"}], "last": true})),
        )
        .mount(&server)
        .await;
    let api = ApiClient::new(ApiEndpoint {
        role: Role::Source,
        url: server.uri(),
        api_key: "key".to_string(),
        customer_id: "customer".to_string(),
    })
    .unwrap();

    // Act
    let records = fetch_all(&api, ResourceKind::Audiences, &PageRequest::default()).await;

    // Assert
    let names: Vec<_> = records.iter().map(|r| r["name"].clone()).collect();
    assert_eq!(names, vec!["A", "B"]);
}
