//! Storage abstraction for draft persistence.

mod autosave;
mod file;
mod memory;
mod snapshot;

pub use autosave::{AutosaveManager, SAVE_DEBOUNCE_MS, SNAPSHOT_KEY};
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use snapshot::{PersistedBackground, PersistedSnapshot, PersistedTextLayer};

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Snapshot not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async storage operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Trait for snapshot storage backends.
///
/// Implementations can store snapshots in memory, on the filesystem, or
/// behind a remote key-value service.
pub trait Storage: Send + Sync {
    /// Save a snapshot under a key.
    fn save(&self, key: &str, snapshot: &PersistedSnapshot) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a snapshot.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<PersistedSnapshot>>;

    /// Delete a snapshot.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Check if a snapshot exists.
    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}
