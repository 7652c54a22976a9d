//! Configuration for the todo application.

use crate::persistence::DEFAULT_STORAGE_KEY;
use crate::storage::FileStorage;
use reactive_atoms_runtime::StoreConfig;
use std::path::PathBuf;

/// Where the list is persisted and how the store runs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoConfig {
    /// Storage key holding the list
    pub storage_key: String,
    /// Directory used by [`FileStorage`]
    pub storage_dir: PathBuf,
    /// Store settings
    pub store: StoreConfig,
}

impl TodoConfig {
    /// Use a different storage key
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Use a different storage directory
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Use different store settings
    #[must_use]
    pub const fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// File storage rooted at [`TodoConfig::storage_dir`]
    #[must_use]
    pub fn file_storage(&self) -> FileStorage {
        FileStorage::new(&self.storage_dir)
    }
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: PathBuf::from(".todomvc"),
            store: StoreConfig::default(),
        }
    }
}
