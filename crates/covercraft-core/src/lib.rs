//! Covercraft Core Library
//!
//! Rendering-agnostic document model and editing logic for the Covercraft
//! cover composition editor.

pub mod debounce;
pub mod document;
pub mod handles;
pub mod history;
pub mod image_source;
pub mod input;
pub mod snap;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_util;

pub use debounce::Debouncer;
pub use document::{
    Color, Document, Filter, FontFamily, FontWeight, LayerId, LayerPatch, TextLayer, CANVAS_SIZE,
    EXPORT_SCALE,
};
pub use handles::{Corner, Handle, HandleKind};
pub use history::{History, MAX_HISTORY};
pub use image_source::{ImageCache, ImageDecodeError, ImageSource};
pub use input::{InputState, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use snap::{
    compute_resize_snap, compute_snap, Guide, GuideAxis, GuideSource, SnapOutcome, SNAP_THRESHOLD,
};
pub use storage::{
    AutosaveManager, FileStorage, MemoryStorage, PersistedSnapshot, Storage, StorageError,
    StorageResult, SAVE_DEBOUNCE_MS, SNAPSHOT_KEY,
};
