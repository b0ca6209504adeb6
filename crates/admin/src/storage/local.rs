//! Filesystem-backed object store.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{ObjectStore, StorageError, check_key};

/// Stores objects as files under a root directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub async fn ensure_root(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        check_key(key)?;
        Ok(self.root.join(key))
    }
}

impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::InvalidKey(key.to_string()))?;
        tokio::fs::create_dir_all(parent).await?;

        // Write to a temporary sibling, then rename, so readers never see a
        // partial file.
        let tmp = parent.join(format!(".upload-{}", Uuid::new_v4().simple()));
        let mut file = tokio::fs::File::create(&tmp).await?;
        if let Err(e) = async {
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await
        {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!(key, size = bytes.len(), "Object stored");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key, "Object already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("pazar-store-{}", Uuid::new_v4().simple()))
    }

    #[tokio::test]
    async fn test_put_and_delete() {
        let root = temp_root();
        let store = LocalObjectStore::new(&root);
        store.ensure_root().await.unwrap();

        store.put("products/ab12-shirt.png", b"png").await.unwrap();
        let written = tokio::fs::read(root.join("products/ab12-shirt.png"))
            .await
            .unwrap();
        assert_eq!(written, b"png");

        store.delete("products/ab12-shirt.png").await.unwrap();
        assert!(!root.join("products/ab12-shirt.png").exists());

        // Deleting again is fine.
        store.delete("products/ab12-shirt.png").await.unwrap();

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let store = LocalObjectStore::new(temp_root());
        assert!(matches!(
            store.put("../outside.txt", b"x").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.delete("/etc/passwd").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
