//! File-based storage implementation.

use super::{BoxFuture, PersistedSnapshot, Storage, StorageError, StorageResult};
use std::fs;
use std::path::PathBuf;

/// File-based storage.
///
/// Stores snapshots as JSON files in a directory.
pub struct FileStorage {
    /// Base directory for snapshot storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/covercraft/drafts/`
    /// On Windows: `%LOCALAPPDATA%\covercraft\drafts\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        let path = base.join("covercraft").join("drafts");
        Self::new(path)
    }

    /// Get the file path for a snapshot key.
    fn snapshot_path(&self, key: &str) -> PathBuf {
        // Sanitize key to be safe for filenames
        let safe_key: String = key
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_path.join(format!("{}.json", safe_key))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn save(&self, key: &str, snapshot: &PersistedSnapshot) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.snapshot_path(key);
        let json = match snapshot.to_json() {
            Ok(j) => j,
            Err(e) => {
                return Box::pin(async move { Err(StorageError::Serialization(e.to_string())) });
            }
        };

        Box::pin(async move {
            fs::write(&path, json).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<PersistedSnapshot>> {
        let path = self.snapshot_path(key);
        let key_owned = key.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(key_owned));
            }

            let json = fs::read_to_string(&path).map_err(|e| {
                StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;

            PersistedSnapshot::from_json(&json).map_err(|e| {
                StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
            })
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.snapshot_path(key);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.snapshot_path(key);
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::test_util::block_on;
    use tempfile::tempdir;

    fn snapshot() -> PersistedSnapshot {
        PersistedSnapshot::from_document(&Document::new().add_text_layer())
    }

    #[test]
    fn test_file_storage_save_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let snap = snapshot();
        block_on(storage.save("cover-draft", &snap)).unwrap();
        let loaded = block_on(storage.load("cover-draft")).unwrap();

        assert_eq!(loaded.text_layers[0].id, snap.text_layers[0].id);
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save("draft", &snapshot())).unwrap();
        assert!(block_on(storage.exists("draft")).unwrap());

        block_on(storage.delete("draft")).unwrap();
        assert!(!block_on(storage.exists("draft")).unwrap());
    }

    #[test]
    fn test_file_storage_sanitizes_key() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let snap = snapshot();
        block_on(storage.save("draft/with:odd*chars", &snap)).unwrap();

        let loaded = block_on(storage.load("draft/with:odd*chars")).unwrap();
        assert_eq!(loaded.text_layers[0].id, snap.text_layers[0].id);
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        std::fs::write(dir.path().join("draft.json"), "{ not valid json").unwrap();
        let result = block_on(storage.load("draft"));
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }
}
