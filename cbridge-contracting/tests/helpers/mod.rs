//! Test Helper Utilities
//!
//! Shared utilities for testing cbridge-contracting

#![allow(dead_code)]

pub mod fake_transport;
pub mod fixtures;
pub mod log_capture;

pub use fake_transport::{FakeTransport, Reply};
pub use log_capture::MessageIds;
pub use fixtures::{
    credentials_body, data_body, memory_cache, test_client, test_orchestrator, BASE_URL,
};
