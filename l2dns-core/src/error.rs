//! Error types for l2dns

use l2dns_corefile::{HostsError, ParseError};
use thiserror::Error;

/// Result type for l2dns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for l2dns
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The stored Corefile could not be parsed
    #[error("could not parse existing corefile: {0}")]
    Corefile(#[from] ParseError),

    /// A document, server block or plugin is missing
    #[error("{0}")]
    NotFound(String),

    /// Caller supplied invalid input
    #[error("{0}")]
    Validation(String),

    /// Document store failure
    #[error("Store error: {0}")]
    Store(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<HostsError> for Error {
    fn from(err: HostsError) -> Self {
        match err {
            HostsError::InvalidIp { .. } | HostsError::InvalidDomain { .. } => {
                Error::Validation(err.to_string())
            }
            HostsError::NotHostsPlugin { .. } => Error::Internal(err.to_string()),
        }
    }
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
