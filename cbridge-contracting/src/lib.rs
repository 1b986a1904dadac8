//! cbridge-contracting library interface
//!
//! Replicates active contracts of qualifying tenders from the public
//! registry into the contracting registry. Exposed as a library so the
//! binary and the integration tests share one implementation.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::db::cache::{CacheStore, CacheValue};
pub use crate::error::{RegistryError, SyncError};
pub use crate::services::feed::{BatchReport, FeedBatch};
pub use crate::services::registry_client::{RegistryClient, RequestContext};
pub use crate::services::sync_orchestrator::{SyncOrchestrator, SyncReport};
pub use crate::utils::retry::RetryPolicy;
