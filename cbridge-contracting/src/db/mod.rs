//! Database access for cbridge-contracting

pub mod cache;

pub use cache::{CacheStore, CacheValue};
