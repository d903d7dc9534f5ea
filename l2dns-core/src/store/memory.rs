//! In-memory document store

use super::{ConfigDocument, DocumentStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Documents held in a process-local map
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<(String, String), ConfigDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `documents`
    pub fn with_documents(documents: impl IntoIterator<Item = ConfigDocument>) -> Self {
        let store = Self::new();
        {
            let mut map = store.documents.write();
            for doc in documents {
                map.insert((doc.namespace.clone(), doc.name.clone()), doc);
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, name: &str, namespace: &str) -> Result<ConfigDocument> {
        self.documents
            .read()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("document {}/{} not found", namespace, name)))
    }

    async fn update(&self, document: ConfigDocument) -> Result<()> {
        let key = (document.namespace.clone(), document.name.clone());
        self.documents.write().insert(key, document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing() {
        let store = MemoryStore::new();
        let err = store.get("coredns", "default").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "document default/coredns not found");
    }

    #[tokio::test]
    async fn test_update_then_get() {
        let store = MemoryStore::new();
        let mut doc = ConfigDocument::new("coredns", "default").with_corefile(".:53 {\n}\n");
        doc.data.insert("other".into(), "kept".into());
        store.update(doc.clone()).await.unwrap();

        let fetched = store.get("coredns", "default").await.unwrap();
        assert_eq!(fetched, doc);
        assert_eq!(fetched.corefile(), Some(".:53 {\n}\n"));
        assert!(store.get("coredns", "kube-system").await.is_err());
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let store = MemoryStore::with_documents([ConfigDocument::new("a", "ns").with_corefile("one")]);
        store
            .update(ConfigDocument::new("a", "ns").with_corefile("two"))
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a", "ns").await.unwrap().corefile(), Some("two"));
    }
}
