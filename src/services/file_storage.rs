//! Pluggable storage backends for document content.
//!
//! The engine tracks each document's `content_path` and is responsible for
//! destroying the content when retention executes. Where that content lives
//! is deployment-specific:
//!
//! - **Filesystem**: content files under a local root directory
//! - **External**: content is owned by another system; deletion here only
//!   clears the registry reference
//!
//! The backend is configured via `[storage]` in the config.

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::{FilesystemStorageConfig, StorageBackend, StorageConfig};

/// Errors that can occur during content storage operations.
#[derive(Debug, Error)]
pub enum FileStorageError {
    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type FileStorageResult<T> = Result<T, FileStorageError>;

/// Trait for pluggable content storage backends.
///
/// Implementations must be `Send + Sync` to support async contexts.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Destroy the content at a stored path.
    ///
    /// Must be idempotent: deleting content that is already gone succeeds,
    /// so a crashed sweep can safely rerun.
    async fn delete(&self, content_path: &str) -> FileStorageResult<()>;

    /// Check whether content exists at a stored path.
    async fn exists(&self, content_path: &str) -> FileStorageResult<bool>;

    /// Get the backend type name (for logging/debugging).
    fn backend_name(&self) -> &'static str;
}

/// Build the configured storage backend.
pub fn build_file_storage(config: &StorageConfig) -> FileStorageResult<Arc<dyn FileStorage>> {
    match config.backend {
        StorageBackend::Filesystem => Ok(Arc::new(FilesystemFileStorage::new(
            config.filesystem.clone(),
        )?)),
        StorageBackend::External => Ok(Arc::new(ExternalFileStorage)),
    }
}

/// Filesystem content storage backend.
///
/// Stored paths are resolved relative to the configured root; absolute
/// paths and traversal segments are rejected so one tenant's record cannot
/// point deletion outside the root.
pub struct FilesystemFileStorage {
    config: FilesystemStorageConfig,
}

impl FilesystemFileStorage {
    pub fn new(config: FilesystemStorageConfig) -> FileStorageResult<Self> {
        let storage = Self { config };

        if storage.config.create_dir {
            let path = Path::new(&storage.config.path);
            if !path.exists() {
                info!(path = %storage.config.path, "Creating content storage directory");
                std::fs::create_dir_all(path)?;
            }
        }

        Ok(storage)
    }

    fn content_path(&self, stored: &str) -> FileStorageResult<std::path::PathBuf> {
        let relative = Path::new(stored);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(FileStorageError::Config(format!(
                "Refusing content path outside storage root: {}",
                stored
            )));
        }
        Ok(Path::new(&self.config.path).join(relative))
    }
}

#[async_trait]
impl FileStorage for FilesystemFileStorage {
    #[instrument(skip(self))]
    async fn delete(&self, content_path: &str) -> FileStorageResult<()> {
        let path = self.content_path(content_path)?;
        debug!(path = %path.display(), "Deleting content from filesystem");

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "Content deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Already gone, likely a rerun after a crash mid-sweep.
                warn!(path = %path.display(), "Content already absent during deletion");
                Ok(())
            }
            Err(e) => Err(FileStorageError::Io(e)),
        }
    }

    #[instrument(skip(self))]
    async fn exists(&self, content_path: &str) -> FileStorageResult<bool> {
        let path = self.content_path(content_path)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}

/// External content storage backend.
///
/// The content lives in a system this engine does not manage; deletion of
/// the bytes is that system's job and the engine only clears its own
/// registry reference. `delete` is therefore a logged no-op.
pub struct ExternalFileStorage;

#[async_trait]
impl FileStorage for ExternalFileStorage {
    async fn delete(&self, content_path: &str) -> FileStorageResult<()> {
        debug!(content_path, "External backend, content deletion delegated");
        Ok(())
    }

    async fn exists(&self, _content_path: &str) -> FileStorageResult<bool> {
        Ok(false)
    }

    fn backend_name(&self) -> &'static str {
        "external"
    }
}
