//! Error types for cbridge-contracting
//!
//! `RegistryError` describes what went wrong talking to a registry;
//! `SyncError` is what a tender workflow surfaces to its caller. Transient
//! conditions never reach either type in production: they are retried inside
//! the registry client and the cache store.

use crate::services::http_transport::TransportError;
use thiserror::Error;

/// Registry client errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Transport-level failure (connection refused, timeout, reset, ...)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Status code the calling operation does not expect
    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Response body is not the expected JSON envelope
    #[error("Parse error: {0}")]
    Parse(String),

    /// Tender document does not have the shape the bridge relies on
    #[error("Invalid tender {tender_id}: {reason}")]
    InvalidTender { tender_id: String, reason: String },

    /// Permission/not-found class answer to a contract creation
    /// (403, 404, 405, 410). Fatal for the current tender.
    #[error("Contract creation refused with HTTP {status}: {body}")]
    Forbidden { status: u16, body: String },
}

/// Errors surfaced by the sync orchestrator and feed handling
#[derive(Debug, Error)]
pub enum SyncError {
    /// Fatal registry outcome; the tender must be redelivered
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Non-transient cache storage failure
    #[error("Cache error: {0}")]
    Cache(#[from] cbridge_common::Error),

    /// Feed source could not be read or acknowledged
    #[error("Feed error: {0}")]
    Feed(String),

    /// At least one tender of a feed batch ended with a fatal error
    #[error("{failed} of {total} tenders in batch failed")]
    Batch { failed: usize, total: usize },
}
