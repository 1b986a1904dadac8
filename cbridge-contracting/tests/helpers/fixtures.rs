//! Fixture builders shared by the integration tests

use super::FakeTransport;
use cbridge_common::db::init_memory_database;
use cbridge_contracting::{CacheStore, RegistryClient, RetryPolicy, SyncOrchestrator};
use serde_json::{json, Value};

pub const BASE_URL: &str = "http://registry.test/api/2.5";

/// `{"data": value}` as a response body
pub fn data_body(value: Value) -> String {
    json!({ "data": value }).to_string()
}

pub fn credentials_body() -> String {
    data_body(json!({"owner": "broker", "tender_token": "token-123"}))
}

/// Registry client with zero-delay unbounded retries
pub fn test_client(transport: &FakeTransport) -> RegistryClient<FakeTransport> {
    RegistryClient::new(
        transport.clone(),
        BASE_URL,
        BASE_URL,
        "test-token",
        RetryPolicy::immediate(),
    )
}

pub async fn memory_cache() -> CacheStore {
    let pool = init_memory_database().await.unwrap();
    CacheStore::new(pool, RetryPolicy::immediate())
}

pub async fn test_orchestrator(transport: &FakeTransport) -> SyncOrchestrator<FakeTransport> {
    SyncOrchestrator::new(test_client(transport), memory_cache().await)
}
