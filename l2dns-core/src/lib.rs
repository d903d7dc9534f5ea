//! l2dns Core Library
//!
//! This crate provides the service layer around the Corefile editor:
//! configuration, error handling, document storage and the DNS manager that
//! edits the stored Corefile.

pub mod config;
pub mod entry;
pub mod error;
pub mod manager;
pub mod store;

pub use entry::DnsEntry;
pub use error::{Error, Result};
pub use manager::DnsManager;

/// l2dns version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
