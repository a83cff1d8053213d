//! Covercraft App Library
//!
//! Wires the document model and renderer into an interactive editor
//! session: pointer and keyboard handling, history, autosave, and the
//! export/delivery pipeline.

pub mod session;
pub mod shortcuts;
pub mod upload;

pub use session::{EditorSession, Interaction, Notice};
pub use shortcuts::{Shortcut, ShortcutRegistry};
pub use upload::{CoverSink, DeliveryError, FileSink, NullSink};
