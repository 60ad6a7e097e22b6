use serde::{Deserialize, Serialize};

/// Content storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Which backend holds document content.
    #[serde(default)]
    pub backend: StorageBackend,

    /// Filesystem backend settings.
    #[serde(default)]
    pub filesystem: FilesystemStorageConfig,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Content files under a local root directory.
    #[default]
    Filesystem,
    /// Content owned by another system; deletion only clears the registry
    /// reference here.
    External,
}

/// Filesystem backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesystemStorageConfig {
    /// Root directory holding content files; stored content paths are
    /// resolved relative to it.
    #[serde(default = "default_storage_path")]
    pub path: String,

    /// Create the root directory on startup if missing.
    #[serde(default = "default_true")]
    pub create_dir: bool,
}

impl Default for FilesystemStorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            create_dir: true,
        }
    }
}

fn default_storage_path() -> String {
    "./document-content".to_string()
}

fn default_true() -> bool {
    true
}
