//! On-disk document store
//!
//! One pretty-printed JSON file per document at
//! `<root>/<namespace>/<name>.json`. Every write goes to its own temporary
//! file in the same directory and is renamed over the document.

use super::{ConfigDocument, DocumentStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Documents persisted as JSON files
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Store in the default location
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("l2dns")
            .join("store")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, name: &str, namespace: &str) -> Result<PathBuf> {
        for part in [name, namespace] {
            if part.is_empty() || part.contains(['/', '\\']) || part == "." || part == ".." {
                return Err(Error::Validation(format!("invalid document path segment: {:?}", part)));
            }
        }
        Ok(self.root.join(namespace).join(format!("{}.json", name)))
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, name: &str, namespace: &str) -> Result<ConfigDocument> {
        let path = self.document_path(name, namespace)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!(
                    "document {}/{} not found",
                    namespace, name
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let mut document: ConfigDocument = serde_json::from_str(&content)
            .map_err(|e| Error::Store(format!("{}: {}", path.display(), e)))?;
        document.name = name.to_string();
        document.namespace = namespace.to_string();
        Ok(document)
    }

    async fn update(&self, document: ConfigDocument) -> Result<()> {
        let path = self.document_path(&document.name, &document.namespace)?;
        let parent = self.root.join(&document.namespace);
        tokio::fs::create_dir_all(&parent).await?;

        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| Error::Store(e.to_string()))?;

        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
            tmp.write_all(json.as_bytes())?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| Error::Internal(format!("document writer task failed: {}", e)))??;

        tracing::debug!("💾 Stored document {}/{} at {:?}", document.namespace, document.name, path);
        Ok(())
    }
}
