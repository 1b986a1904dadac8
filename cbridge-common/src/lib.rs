//! # cbridge common library
//!
//! Shared code for the contracting bridge services:
//! - Error and result types
//! - TOML configuration loading and compiled defaults
//! - SQLite initialisation for the sync cache
//! - Tracing initialisation
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod time;

pub use error::{Error, Result};
