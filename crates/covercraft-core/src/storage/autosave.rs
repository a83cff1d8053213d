//! Debounced autosave of the in-progress draft.
//!
//! Document edits schedule a save; the write happens only after the edit
//! stream goes quiet for the debounce window, so a drag producing dozens
//! of mutations costs one write.

use super::{PersistedSnapshot, Storage, StorageError, StorageResult};
use crate::debounce::Debouncer;
use crate::document::Document;
use crate::image_source::ImageCache;
use std::sync::Arc;
use std::time::Duration;

/// Debounce window for draft persistence, in milliseconds.
pub const SAVE_DEBOUNCE_MS: u64 = 500;

/// Storage key of the single in-progress draft.
pub const SNAPSHOT_KEY: &str = "cover-draft";

/// Wraps a storage backend with debounced draft persistence.
pub struct AutosaveManager<S: Storage> {
    storage: Arc<S>,
    debounce: Debouncer,
    /// Latest snapshot awaiting the debounce deadline. A newer schedule
    /// replaces it; only the last state ever reaches storage.
    pending: Option<PersistedSnapshot>,
}

impl<S: Storage> AutosaveManager<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            debounce: Debouncer::new(Duration::from_millis(SAVE_DEBOUNCE_MS)),
            pending: None,
        }
    }

    /// Capture the document and arm (or re-arm) the debounce window.
    pub fn schedule_save(&mut self, doc: &Document) {
        self.pending = Some(PersistedSnapshot::from_document(doc));
        self.debounce.trigger();
    }

    /// Whether a save is scheduled but not yet written.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Write the pending snapshot if the debounce deadline has passed.
    /// Returns true if a save was performed.
    pub async fn tick(&mut self) -> StorageResult<bool> {
        if !self.debounce.fire_ready() {
            return Ok(false);
        }
        self.write_pending().await?;
        Ok(true)
    }

    /// Write the pending snapshot immediately, ignoring the deadline.
    /// Used on shutdown so a fresh edit is not lost.
    pub async fn flush(&mut self) -> StorageResult<()> {
        self.debounce.cancel();
        self.write_pending().await
    }

    async fn write_pending(&mut self) -> StorageResult<()> {
        if let Some(snapshot) = self.pending.take() {
            self.storage.save(SNAPSHOT_KEY, &snapshot).await?;
            log::debug!("draft saved under {:?}", SNAPSHOT_KEY);
        }
        Ok(())
    }

    /// Load the saved draft, resolving image tokens through the cache.
    ///
    /// Absent or corrupt data is a recoverable condition: it logs a
    /// warning and returns None so the caller starts from the default
    /// document.
    pub async fn restore(&self, images: &ImageCache) -> Option<Document> {
        match self.storage.load(SNAPSHOT_KEY).await {
            Ok(snapshot) => Some(snapshot.into_document(images)),
            Err(StorageError::NotFound(_)) => None,
            Err(e) => {
                log::warn!("failed to restore draft, starting fresh: {}", e);
                None
            }
        }
    }

    /// Discard the saved draft.
    pub async fn clear(&mut self) -> StorageResult<()> {
        self.pending = None;
        self.debounce.cancel();
        self.storage.delete(SNAPSHOT_KEY).await
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    #[cfg(test)]
    fn debounce_mut(&mut self) -> &mut Debouncer {
        &mut self.debounce
    }
}
