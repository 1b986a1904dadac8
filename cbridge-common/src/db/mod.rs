//! Database initialisation for the sync cache

pub mod init;

pub use init::*;
