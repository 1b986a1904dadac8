//! Registry client integration tests
//!
//! Status classification, retry behaviour and per-request headers, all
//! against the scripted transport.

mod helpers;

use cbridge_contracting::error::RegistryError;
use cbridge_contracting::models::Contract;
use cbridge_contracting::services::http_transport::HttpMethod;
use cbridge_contracting::services::registry_client::{ContractPresence, CreateOutcome};
use cbridge_contracting::{RegistryClient, RequestContext, RetryPolicy};
use helpers::{credentials_body, data_body, test_client, FakeTransport, Reply, BASE_URL};
use serde_json::json;

fn contract() -> Contract {
    serde_json::from_value(json!({"id": "c1", "status": "active", "items": [{"id": "i1"}]})).unwrap()
}

#[tokio::test]
async fn test_get_tender_retries_until_200() {
    let transport = FakeTransport::new();
    transport.on(
        HttpMethod::Get,
        "/tenders/t1",
        vec![
            Reply::NetworkError,
            Reply::status(503),
            Reply::json(200, "not json"),
            Reply::json(200, data_body(json!({"id": "t1", "status": "complete"}))),
        ],
    );
    let client = test_client(&transport);

    let tender = client.get_tender("t1", &RequestContext::default()).await.unwrap();

    assert_eq!(tender.id.as_key(), "t1");
    assert_eq!(transport.count(HttpMethod::Get, "/tenders/t1"), 4);
}

#[tokio::test]
async fn test_get_tender_with_wrong_shape_is_invalid_tender() {
    let transport = FakeTransport::new();
    transport.on(
        HttpMethod::Get,
        "/tenders/t1",
        vec![Reply::json(200, data_body(json!({"status": "complete"})))],
    );
    let client = test_client(&transport);

    let err = client.get_tender("t1", &RequestContext::default()).await.unwrap_err();

    assert!(matches!(err, RegistryError::InvalidTender { ref tender_id, .. } if tender_id == "t1"));
    assert_eq!(transport.count(HttpMethod::Get, "/tenders/t1"), 1);
}

#[tokio::test]
async fn test_get_tender_credentials() {
    let transport = FakeTransport::new();
    transport.on(
        HttpMethod::Get,
        "/tenders/t1/extract_credentials",
        vec![
            Reply::status(403),
            // Missing tender_token: retried like any malformed answer
            Reply::json(200, data_body(json!({"owner": "broker"}))),
            Reply::json(200, credentials_body()),
        ],
    );
    let client = test_client(&transport);

    let credentials = client
        .get_tender_credentials("t1", &RequestContext::default())
        .await
        .unwrap();

    assert_eq!(credentials.owner, "broker");
    assert_eq!(credentials.tender_token, "token-123");
    assert_eq!(transport.count(HttpMethod::Get, "/extract_credentials"), 3);
}

#[tokio::test]
async fn test_bounded_policy_gives_up_on_read() {
    let transport = FakeTransport::new();
    transport.on(HttpMethod::Get, "/tenders/t1", vec![Reply::status(500)]);
    let client = RegistryClient::new(
        transport.clone(),
        BASE_URL,
        BASE_URL,
        "test-token",
        RetryPolicy::immediate().with_max_attempts(3),
    );

    let err = client.get_tender("t1", &RequestContext::default()).await.unwrap_err();

    assert!(matches!(err, RegistryError::UnexpectedStatus { status: 500, .. }));
    assert_eq!(transport.count(HttpMethod::Get, "/tenders/t1"), 3);
}

#[tokio::test]
async fn test_contract_exists_statuses() {
    let transport = FakeTransport::new();
    transport
        .on(HttpMethod::Get, "/contracts/exists", vec![Reply::status(200)])
        .on(HttpMethod::Get, "/contracts/missing", vec![Reply::status(404)])
        .on(HttpMethod::Get, "/contracts/archived", vec![Reply::status(410)])
        .on(HttpMethod::Get, "/contracts/broken", vec![Reply::status(500)]);
    let client = test_client(&transport);
    let ctx = RequestContext::default();

    assert_eq!(client.contract_exists("exists", &ctx).await.unwrap(), ContractPresence::Exists);
    assert_eq!(client.contract_exists("missing", &ctx).await.unwrap(), ContractPresence::Missing);
    assert_eq!(client.contract_exists("archived", &ctx).await.unwrap(), ContractPresence::Archived);

    // Not retried: the caller aborts the tender scan
    let err = client.contract_exists("broken", &ctx).await.unwrap_err();
    assert!(matches!(err, RegistryError::UnexpectedStatus { status: 500, .. }));
    assert_eq!(transport.count(HttpMethod::Get, "/contracts/broken"), 1);
}

#[tokio::test]
async fn test_contract_exists_retries_transport_errors() {
    let transport = FakeTransport::new();
    transport.on(
        HttpMethod::Get,
        "/contracts/c1",
        vec![Reply::NetworkError, Reply::NetworkError, Reply::status(404)],
    );
    let client = test_client(&transport);

    let presence = client.contract_exists("c1", &RequestContext::default()).await.unwrap();

    assert_eq!(presence, ContractPresence::Missing);
    assert_eq!(transport.count(HttpMethod::Get, "/contracts/c1"), 3);
}

#[tokio::test]
async fn test_create_contract_posts_envelope() {
    let transport = FakeTransport::new();
    transport.on(HttpMethod::Post, "/contracts", vec![Reply::json(201, data_body(json!({"id": "c1"})))]);
    let client = test_client(&transport);

    let outcome = client.create_contract(&contract(), &RequestContext::default()).await.unwrap();

    assert_eq!(outcome, CreateOutcome::Created);
    let posts = transport.requests_to(HttpMethod::Post, "/contracts");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].url, format!("{}/contracts", BASE_URL));
    assert_eq!(posts[0].header_value("Content-Type"), Some("application/json"));
    assert_eq!(
        posts[0].body,
        Some(json!({"data": {"id": "c1", "status": "active", "items": [{"id": "i1"}]}}))
    );
}

#[tokio::test]
async fn test_create_contract_retries_unlisted_statuses() {
    let transport = FakeTransport::new();
    transport.on(
        HttpMethod::Post,
        "/contracts",
        vec![Reply::status(500), Reply::NetworkError, Reply::status(429), Reply::status(201)],
    );
    let client = test_client(&transport);

    let outcome = client.create_contract(&contract(), &RequestContext::default()).await.unwrap();

    assert_eq!(outcome, CreateOutcome::Created);
    assert_eq!(transport.count(HttpMethod::Post, "/contracts"), 4);
}

#[tokio::test]
async fn test_create_contract_terminal_outcomes() {
    for (status, expected) in [
        (409, CreateOutcome::AlreadyExists),
        (400, CreateOutcome::AlreadyExists),
        (422, CreateOutcome::Rejected { body: "{\"errors\":[]}".to_string() }),
    ] {
        let transport = FakeTransport::new();
        transport.on(HttpMethod::Post, "/contracts", vec![Reply::json(status, "{\"errors\":[]}")]);
        let client = test_client(&transport);

        let outcome = client.create_contract(&contract(), &RequestContext::default()).await.unwrap();

        assert_eq!(outcome, expected, "status {}", status);
        assert_eq!(transport.count(HttpMethod::Post, "/contracts"), 1);
    }
}

#[tokio::test]
async fn test_create_contract_forbidden_class_is_fatal() {
    for status in [403, 404, 405, 410] {
        let transport = FakeTransport::new();
        transport.on(HttpMethod::Post, "/contracts", vec![Reply::status(status)]);
        let client = test_client(&transport);

        let err = client
            .create_contract(&contract(), &RequestContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::Forbidden { status: s, .. } if s == status));
        assert_eq!(transport.count(HttpMethod::Post, "/contracts"), 1);
    }
}

#[tokio::test]
async fn test_every_request_carries_its_own_headers() {
    let transport = FakeTransport::new();
    transport
        .on(HttpMethod::Get, "/contracts/c1", vec![Reply::status(404)])
        .on(HttpMethod::Get, "/contracts/c2", vec![Reply::status(404)]);
    let client = test_client(&transport);

    client
        .contract_exists("c1", &RequestContext::new(Some("backend-a".to_string())))
        .await
        .unwrap();
    client.contract_exists("c2", &RequestContext::default()).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);

    assert_eq!(requests[0].header_value("Authorization"), Some("Bearer test-token"));
    assert_eq!(requests[0].header_value("Cookie"), Some("SERVER_ID=backend-a"));
    assert_eq!(requests[1].header_value("Cookie"), None);

    let first_id = requests[0].header_value("X-Client-Request-ID").unwrap();
    let second_id = requests[1].header_value("X-Client-Request-ID").unwrap();
    assert!(first_id.starts_with("contracting-data-bridge-req-"));
    assert_ne!(first_id, second_id);
}
