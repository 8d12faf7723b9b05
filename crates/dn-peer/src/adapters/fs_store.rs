//! # Filesystem Store
//!
//! Owned files live in one directory (`myfiles/` by default), downloaded
//! replicas in another (`otherfiles/`). File names are single path
//! components; anything else is rejected.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::StorageConfig;
use crate::ports::{FileStore, Namespace, StoreError};

/// [`FileStore`] over two local directories.
#[derive(Debug, Clone)]
pub struct FsFileStore {
    owned_dir: PathBuf,
    replica_dir: PathBuf,
}

impl FsFileStore {
    pub fn new(owned_dir: impl Into<PathBuf>, replica_dir: impl Into<PathBuf>) -> Self {
        Self {
            owned_dir: owned_dir.into(),
            replica_dir: replica_dir.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.owned_dir.clone(), config.replica_dir.clone())
    }

    /// Creates both directories if missing.
    pub async fn ensure_dirs(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.owned_dir).await?;
        tokio::fs::create_dir_all(&self.replica_dir).await?;
        Ok(())
    }

    pub fn dir(&self, namespace: Namespace) -> &Path {
        match namespace {
            Namespace::Owned => &self.owned_dir,
            Namespace::Replica => &self.replica_dir,
        }
    }

    fn path_of(&self, namespace: Namespace, filename: &str) -> Result<PathBuf, StoreError> {
        let valid = !filename.is_empty()
            && filename != "."
            && filename != ".."
            && !filename.contains(|c: char| c == '/' || c == '\\');
        if !valid {
            return Err(StoreError::InvalidName(filename.to_string()));
        }
        Ok(self.dir(namespace).join(filename))
    }
}

#[async_trait]
impl FileStore for FsFileStore {
    async fn read(&self, namespace: Namespace, filename: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_of(namespace, filename)?;
        tokio::fs::read(&path).await.map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound {
                namespace,
                filename: filename.to_string(),
            },
            _ => StoreError::Io(err),
        })
    }

    async fn write(
        &self,
        namespace: Namespace,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        let path = self.path_of(namespace, filename)?;
        tokio::fs::create_dir_all(self.dir(namespace)).await?;
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "Wrote file");
        Ok(())
    }

    async fn list(&self, namespace: Namespace) -> Result<Vec<String>, StoreError> {
        let mut entries = match tokio::fs::read_dir(self.dir(namespace)).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
