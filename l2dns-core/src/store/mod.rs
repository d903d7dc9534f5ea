//! Document storage
//!
//! A document is a small key-value bag. The Corefile lives under
//! [`COREFILE_KEY`]; other keys are carried through untouched.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key under which the Corefile text is stored
pub const COREFILE_KEY: &str = "Corefile";

/// A named document holding string data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl ConfigDocument {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            data: BTreeMap::new(),
        }
    }

    /// Document carrying `corefile` under [`COREFILE_KEY`]
    pub fn with_corefile(mut self, corefile: impl Into<String>) -> Self {
        self.data.insert(COREFILE_KEY.to_string(), corefile.into());
        self
    }

    pub fn corefile(&self) -> Option<&str> {
        self.data.get(COREFILE_KEY).map(String::as_str)
    }

    pub fn set_corefile(&mut self, corefile: impl Into<String>) {
        self.data.insert(COREFILE_KEY.to_string(), corefile.into());
    }
}

/// Storage backend for documents
///
/// Writes replace the whole document; the last writer wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, failing with [`crate::Error::NotFound`] when absent
    async fn get(&self, name: &str, namespace: &str) -> Result<ConfigDocument>;

    /// Create or replace a document
    async fn update(&self, document: ConfigDocument) -> Result<()>;
}
