//! Bounded undo/redo history over immutable document snapshots.

use crate::document::Document;
use std::collections::VecDeque;

/// Maximum retained undo entries. The oldest entry is evicted silently
/// when the bound is exceeded.
pub const MAX_HISTORY: usize = 50;

/// A pre-mutation snapshot with a monotonic sequence number.
#[derive(Debug, Clone)]
struct HistoryEntry {
    seq: u64,
    doc: Document,
}

/// Two-stack undo/redo controller.
///
/// Callers push the document state as it was *before* a mutation. Undo
/// swaps the current state for the newest snapshot; redo walks back.
/// Any new push clears the redo stack.
#[derive(Debug, Default)]
pub struct History {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    next_seq: u64,
    /// Base state captured at the start of a coalesced interaction.
    coalescing_base: Option<Document>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pre-mutation snapshot. Clears redo.
    pub fn push(&mut self, doc: Document) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.undo_stack.push_back(HistoryEntry { seq, doc });
        if self.undo_stack.len() > MAX_HISTORY {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
    }

    /// Undo: returns the snapshot to restore, storing `current` for redo.
    pub fn undo(&mut self, current: &Document) -> Option<Document> {
        let entry = self.undo_stack.pop_back()?;
        self.redo_stack.push(HistoryEntry {
            seq: entry.seq,
            doc: current.clone(),
        });
        Some(entry.doc)
    }

    /// Redo: returns the snapshot to restore, storing `current` for undo.
    /// Bypasses the eviction path so an undone entry always comes back.
    pub fn redo(&mut self, current: &Document) -> Option<Document> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push_back(HistoryEntry {
            seq: entry.seq,
            doc: current.clone(),
        });
        if self.undo_stack.len() > MAX_HISTORY {
            self.undo_stack.pop_front();
        }
        Some(entry.doc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Capture the base state of a continuous interaction (drag, resize,
    /// rotate, text editing). Intermediate states are never pushed.
    pub fn begin_coalescing(&mut self, doc: Document) {
        self.coalescing_base = Some(doc);
    }

    /// Push the captured base as a single entry. No-op when no
    /// interaction is in progress.
    pub fn commit_coalescing(&mut self) {
        if let Some(base) = self.coalescing_base.take() {
            self.push(base);
        }
    }

    /// Drop the captured base without recording anything.
    pub fn abort_coalescing(&mut self) {
        self.coalescing_base = None;
    }

    pub fn is_coalescing(&self) -> bool {
        self.coalescing_base.is_some()
    }

    /// The base document of the in-progress interaction, if any.
    pub fn coalescing_base(&self) -> Option<&Document> {
        self.coalescing_base.as_ref()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.coalescing_base = None;
    }
}
