//! The editor session: translates input into document mutations and owns
//! history, autosave scheduling, selection, and the export protocol.

use covercraft_core::handles::{hit_test_handles, Corner, HandleKind, HANDLE_HIT_TOLERANCE};
use covercraft_core::{
    compute_resize_snap, compute_snap, AutosaveManager, Document, Filter, Guide, History,
    ImageCache, ImageSource, InputState, KeyEvent, LayerId, LayerPatch, MouseButton, PointerEvent,
    Storage, StorageResult, TextLayer,
};
use covercraft_render::{ExportError, ExportQueue};
use kurbo::{Point, Vec2};
use rand::Rng;
use std::sync::Arc;

/// Rotation step when Shift is held during a rotate gesture, in degrees.
const ROTATION_SNAP_STEP: f64 = 15.0;

/// Hit tolerance for selecting a layer body, in edit units.
const LAYER_HIT_TOLERANCE: f64 = 2.0;

/// User-visible, non-fatal messages surfaced by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// The active pointer interaction.
#[derive(Debug, Clone)]
pub enum Interaction {
    Idle,
    /// Moving a layer. `grab_offset` is pointer minus layer center at the
    /// grab instant; `moved` gates the history entry.
    Dragging {
        id: LayerId,
        grab_offset: Vec2,
        moved: bool,
    },
    /// Scaling a layer from a corner handle.
    Resizing {
        id: LayerId,
        corner: Corner,
        moved: bool,
    },
    /// Rotating a layer around its center.
    Rotating { id: LayerId, moved: bool },
    /// Inline text editing; the draft replaces the layer text only on
    /// commit, so the whole edit is one history entry.
    EditingText { id: LayerId, draft: String },
}

impl Interaction {
    pub fn is_idle(&self) -> bool {
        matches!(self, Interaction::Idle)
    }
}

/// Single-threaded editor session. The session is the only writer of the
/// document; rendering reads `document()`, `selection()` and `guides()`.
pub struct EditorSession<S: Storage> {
    doc: Document,
    selected: Option<LayerId>,
    history: History,
    autosave: AutosaveManager<S>,
    images: ImageCache,
    input: InputState,
    interaction: Interaction,
    guides: Vec<Guide>,
    notices: Vec<Notice>,
    exports: ExportQueue,
    export_requested: bool,
}

impl<S: Storage> EditorSession<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            doc: Document::new(),
            selected: None,
            history: History::new(),
            autosave: AutosaveManager::new(storage),
            images: ImageCache::new(),
            input: InputState::new(),
            interaction: Interaction::Idle,
            guides: Vec::new(),
            notices: Vec::new(),
            exports: ExportQueue::new(),
            export_requested: false,
        }
    }

    /// Load the saved draft, falling back to the default document.
    pub async fn restore(&mut self) {
        match self.autosave.restore(&self.images).await {
            Some(doc) => {
                log::info!("restored draft with {} text layers", doc.text_layers.len());
                self.doc = doc;
            }
            None => {
                log::info!("no restorable draft, starting fresh");
                self.doc = Document::new();
            }
        }
        self.history.clear();
        self.selected = None;
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Option<LayerId> {
        self.selected
    }

    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn images_mut(&mut self) -> &mut ImageCache {
        &mut self.images
    }

    /// Drain accumulated notices for display.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Apply a discrete mutation: one history entry, then persistence.
    fn commit(&mut self, next: Document) {
        self.history.push(self.doc.clone());
        self.doc = next;
        self.autosave.schedule_save(&self.doc);
    }

    // ----- pointer handling -----

    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        self.input.handle_pointer_event(event.clone());
        match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
            } => {
                if self.input.is_double_click() {
                    self.begin_text_editing_at(position);
                } else {
                    self.pointer_down(position);
                }
            }
            PointerEvent::Up {
                button: MouseButton::Left,
                ..
            } => self.pointer_up(),
            PointerEvent::Move { position } => self.pointer_move(position),
            _ => {}
        }
    }

    fn pointer_down(&mut self, position: Point) {
        if let Interaction::EditingText { .. } = self.interaction {
            self.end_text_editing();
        }

        // Handles of the current selection take priority over layer bodies.
        if let Some(layer) = self.selected.and_then(|id| self.doc.layer(id)) {
            if let Some(kind) = hit_test_handles(layer, position, HANDLE_HIT_TOLERANCE) {
                let id = layer.id;
                self.history.begin_coalescing(self.doc.clone());
                self.interaction = match kind {
                    HandleKind::Corner(corner) => Interaction::Resizing {
                        id,
                        corner,
                        moved: false,
                    },
                    HandleKind::Rotate => Interaction::Rotating { id, moved: false },
                };
                return;
            }
        }

        let hit = self
            .doc
            .layer_at_point(position, LAYER_HIT_TOLERANCE)
            .and_then(|id| self.doc.layer(id).map(|l| (id, l.x, l.y)));
        match hit {
            Some((id, x, y)) => {
                self.selected = Some(id);
                let grab_offset = Vec2::new(position.x - x, position.y - y);
                self.history.begin_coalescing(self.doc.clone());
                self.interaction = Interaction::Dragging {
                    id,
                    grab_offset,
                    moved: false,
                };
            }
            None => {
                self.selected = None;
                self.interaction = Interaction::Idle;
            }
        }
    }

    fn pointer_move(&mut self, position: Point) {
        match self.interaction.clone() {
            Interaction::Dragging {
                id, grab_offset, ..
            } => {
                let proposed_x = position.x - grab_offset.x;
                let proposed_y = position.y - grab_offset.y;
                let outcome = compute_snap(&self.doc, id, proposed_x, proposed_y);
                self.doc = self
                    .doc
                    .update_layer(id, LayerPatch::position(outcome.x, outcome.y));
                self.guides = outcome.guides;
                self.interaction = Interaction::Dragging {
                    id,
                    grab_offset,
                    moved: true,
                };
            }
            Interaction::Resizing { id, corner, .. } => {
                self.apply_resize(id, corner, position);
                self.interaction = Interaction::Resizing {
                    id,
                    corner,
                    moved: true,
                };
            }
            Interaction::Rotating { id, .. } => {
                self.apply_rotation(id, position);
                self.interaction = Interaction::Rotating { id, moved: true };
            }
            _ => {}
        }
    }

    fn pointer_up(&mut self) {
        let moved = match &self.interaction {
            Interaction::Dragging { moved, .. }
            | Interaction::Resizing { moved, .. }
            | Interaction::Rotating { moved, .. } => *moved,
            _ => false,
        };
        match &self.interaction {
            Interaction::Dragging { .. }
            | Interaction::Resizing { .. }
            | Interaction::Rotating { .. } => {
                if moved {
                    self.history.commit_coalescing();
                    self.autosave.schedule_save(&self.doc);
                } else {
                    self.history.abort_coalescing();
                }
                self.guides.clear();
                self.interaction = Interaction::Idle;
            }
            _ => {}
        }
    }

    /// Scale the grabbed corner toward or away from the fixed center,
    /// flooring at the minimum layer extent, then snap the resulting
    /// bounding box.
    fn apply_resize(&mut self, id: LayerId, corner: Corner, position: Point) {
        let Some(layer) = self.doc.layer(id) else {
            return;
        };
        let (base_w, base_h) = layer.base_size();
        let theta = layer.rotation.to_radians();
        let (cos_r, sin_r) = (theta.cos(), theta.sin());
        let dx = position.x - layer.x;
        let dy = position.y - layer.y;
        // Pointer in layer-local coordinates.
        let local_x = dx * cos_r + dy * sin_r;
        let local_y = -dx * sin_r + dy * cos_r;

        // Extent measured toward the grabbed corner; a pointer past the
        // center collapses to the minimum instead of mirroring the layer
        // back out.
        let (sx_sign, sy_sign) = corner.signs();
        let ext_x = (local_x * sx_sign).max(0.0);
        let ext_y = (local_y * sy_sign).max(0.0);

        let min_scale_x = TextLayer::MIN_SIZE / base_w;
        let min_scale_y = TextLayer::MIN_SIZE / base_h;
        let mut scale_x = (ext_x * 2.0 / base_w).max(min_scale_x);
        let mut scale_y = (ext_y * 2.0 / base_h).max(min_scale_y);
        if self.input.modifiers.shift {
            // Uniform scale from the dominant axis.
            let uniform = scale_x.max(scale_y);
            scale_x = uniform.max(min_scale_x);
            scale_y = uniform.max(min_scale_y);
        }

        let patch = LayerPatch {
            scale_x: Some(scale_x),
            scale_y: Some(scale_y),
            ..LayerPatch::default()
        };
        self.doc = self.doc.update_layer(id, patch);

        // Snap the post-resize box; the outcome translates the layer.
        let Some(layer) = self.doc.layer(id) else {
            return;
        };
        let bounds = layer.bounds();
        let (x, y) = (layer.x, layer.y);
        let outcome = compute_resize_snap(&self.doc, id, bounds);
        let shift = Vec2::new(
            outcome.bounds.center().x - bounds.center().x,
            outcome.bounds.center().y - bounds.center().y,
        );
        if shift.hypot() > 0.0 {
            let patch = LayerPatch::position(x + shift.x, y + shift.y);
            self.doc = self.doc.update_layer(id, patch);
        }
        self.guides = outcome.guides;
    }

    fn apply_rotation(&mut self, id: LayerId, position: Point) {
        let Some(layer) = self.doc.layer(id) else {
            return;
        };
        let dx = position.x - layer.x;
        let dy = position.y - layer.y;
        // The rotate handle sits above the layer, so zero degrees is up.
        let mut degrees = dy.atan2(dx).to_degrees() + 90.0;
        if self.input.modifiers.shift {
            degrees = (degrees / ROTATION_SNAP_STEP).round() * ROTATION_SNAP_STEP;
        }
        self.doc = self.doc.update_layer(id, LayerPatch::rotation(degrees));
    }

    // ----- text editing -----

    fn begin_text_editing_at(&mut self, position: Point) {
        self.end_text_editing();
        if let Some(id) = self.doc.layer_at_point(position, LAYER_HIT_TOLERANCE) {
            // Discard any drag state from the first click of the pair.
            self.history.abort_coalescing();
            self.selected = Some(id);
            let draft = self.doc.layer(id).map(|l| l.text.clone()).unwrap_or_default();
            self.interaction = Interaction::EditingText { id, draft };
        }
    }

    /// Commit the draft as a single history entry. No entry when the text
    /// is unchanged.
    pub fn end_text_editing(&mut self) {
        if let Interaction::EditingText { id, draft } = self.interaction.clone() {
            let unchanged = self
                .doc
                .layer(id)
                .map(|l| l.text == draft)
                .unwrap_or(true);
            if !unchanged {
                self.commit(self.doc.update_layer(id, LayerPatch::text(draft)));
            }
            self.interaction = Interaction::Idle;
        }
    }

    /// Drop the draft without touching the document.
    pub fn cancel_text_editing(&mut self) {
        if matches!(self.interaction, Interaction::EditingText { .. }) {
            self.interaction = Interaction::Idle;
        }
    }

    // ----- keyboard -----

    pub fn handle_key_event(&mut self, event: KeyEvent) {
        self.input.handle_key_event(event.clone());
        let KeyEvent::Pressed(key) = event else {
            return;
        };

        // Text editing captures keys before shortcuts.
        if let Interaction::EditingText { id, mut draft } = self.interaction.clone() {
            match key.as_str() {
                "Enter" => self.end_text_editing(),
                "Escape" => self.cancel_text_editing(),
                "Backspace" => {
                    draft.pop();
                    self.interaction = Interaction::EditingText { id, draft };
                }
                k if k.chars().count() == 1 && !self.input.modifiers.ctrl => {
                    draft.push_str(k);
                    self.interaction = Interaction::EditingText { id, draft };
                }
                _ => {}
            }
            return;
        }

        let ctrl = self.input.modifiers.ctrl;
        let shift = self.input.modifiers.shift;
        match key.as_str() {
            "z" | "Z" if ctrl && shift => self.redo(),
            "z" | "Z" if ctrl => self.undo(),
            "y" | "Y" if ctrl => self.redo(),
            "e" | "E" if ctrl => self.export_requested = true,
            "Delete" | "Backspace" => self.delete_selected(),
            "Escape" => {
                self.selected = None;
                self.guides.clear();
            }
            "t" | "T" if !ctrl => self.add_text_layer(),
            _ => {}
        }
    }

    // ----- discrete operations -----

    /// Append a default text layer and select it.
    pub fn add_text_layer(&mut self) {
        let next = self.doc.add_text_layer();
        let id = next.text_layers.last().map(|l| l.id);
        self.commit(next);
        self.selected = id;
    }

    /// Delete the selected layer. No-op without a selection.
    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected else {
            return;
        };
        if self.doc.layer(id).is_none() {
            self.selected = None;
            return;
        }
        self.commit(self.doc.remove_layer(id));
        self.selected = None;
    }

    /// Apply a style patch to the selected layer.
    pub fn apply_style(&mut self, patch: LayerPatch) {
        let Some(id) = self.selected else {
            return;
        };
        if self.doc.layer(id).is_none() {
            return;
        }
        self.commit(self.doc.update_layer(id, patch));
    }

    pub fn set_filter(&mut self, filter: Filter, intensity: f64) {
        self.commit(self.doc.set_filter(filter, intensity));
    }

    /// Decode and install a background image. A decode failure raises a
    /// notice and leaves the document untouched.
    pub fn upload_background(&mut self, bytes: &[u8]) {
        match ImageSource::decode(bytes) {
            Ok(source) => {
                let handle = self.images.insert(source);
                self.commit(self.doc.set_background_image(handle));
            }
            Err(e) => {
                log::warn!("background upload rejected: {}", e);
                self.notices
                    .push(Notice::Error(format!("Could not read image: {}", e)));
            }
        }
    }

    pub fn clear_background(&mut self) {
        self.commit(self.doc.clear_background_image());
    }

    /// Move the selected layer to a new paint-order index.
    pub fn reorder_selected(&mut self, new_index: usize) {
        let Some(id) = self.selected else {
            return;
        };
        self.commit(self.doc.reorder_layer(id, new_index));
    }

    /// Shuffle the design: random filter and text geometry.
    pub fn randomize_design<R: Rng>(&mut self, rng: &mut R) {
        self.commit(self.doc.randomized(rng));
    }

    /// Reset to the default document. One history entry, so it can be
    /// undone.
    pub fn reset_design(&mut self) {
        self.commit(Document::new());
        self.selected = None;
    }

    // ----- history -----

    pub fn undo(&mut self) {
        if let Some(doc) = self.history.undo(&self.doc) {
            self.doc = doc;
            self.prune_selection();
            self.autosave.schedule_save(&self.doc);
        }
    }

    pub fn redo(&mut self) {
        if let Some(doc) = self.history.redo(&self.doc) {
            self.doc = doc;
            self.prune_selection();
            self.autosave.schedule_save(&self.doc);
        }
    }

    fn prune_selection(&mut self) {
        if let Some(id) = self.selected {
            if self.doc.layer(id).is_none() {
                self.selected = None;
            }
        }
    }

    // ----- export -----

    /// Whether Ctrl+E was pressed since the last check. The frontend
    /// follows up with `request_export`.
    pub fn take_export_request(&mut self) -> bool {
        std::mem::take(&mut self.export_requested)
    }

    /// Snapshot the document through the export queue. Returns the
    /// snapshot to render when the queue was idle.
    pub fn request_export(&mut self) -> Option<Document> {
        self.exports.begin(self.doc.clone())
    }

    /// Report an export outcome. A failure surfaces as a notice; either
    /// way the queued snapshot (if any) is returned for the next run.
    pub fn complete_export(&mut self, outcome: Result<(), ExportError>) -> Option<Document> {
        match outcome {
            Ok(()) => self
                .notices
                .push(Notice::Info("Cover exported".to_string())),
            Err(e) => {
                log::warn!("export failed: {}", e);
                self.notices
                    .push(Notice::Error(format!("Export failed: {}", e)));
            }
        }
        self.exports.complete()
    }

    // ----- persistence -----

    /// Advance the autosave debounce. Call once per frame.
    pub async fn tick(&mut self) -> StorageResult<bool> {
        self.autosave.tick().await
    }

    /// Force any pending save to disk.
    pub async fn flush(&mut self) -> StorageResult<()> {
        self.autosave.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covercraft_core::{MemoryStorage, PersistedSnapshot, SNAPSHOT_KEY};
    use pollster::block_on;

    fn session() -> EditorSession<MemoryStorage> {
        EditorSession::new(Arc::new(MemoryStorage::new()))
    }

    fn press(session: &mut EditorSession<MemoryStorage>, position: Point) {
        session.handle_pointer_event(PointerEvent::Down {
            position,
            button: MouseButton::Left,
        });
    }

    fn release(session: &mut EditorSession<MemoryStorage>, position: Point) {
        session.handle_pointer_event(PointerEvent::Up {
            position,
            button: MouseButton::Left,
        });
    }

    fn move_to(session: &mut EditorSession<MemoryStorage>, position: Point) {
        session.handle_pointer_event(PointerEvent::Move { position });
    }

    #[test]
    fn test_add_layer_selects_it() {
        let mut s = session();
        s.add_text_layer();
        assert_eq!(s.document().text_layers.len(), 1);
        assert_eq!(s.selection(), Some(s.document().text_layers[0].id));
        assert!(s.can_undo());
    }

    #[test]
    fn test_drag_is_one_history_entry() {
        let mut s = session();
        s.add_text_layer();
        let id = s.document().text_layers[0].id;

        press(&mut s, Point::new(250.0, 250.0));
        move_to(&mut s, Point::new(300.0, 200.0));
        move_to(&mut s, Point::new(340.0, 180.0));
        move_to(&mut s, Point::new(360.0, 170.0));
        release(&mut s, Point::new(360.0, 170.0));

        // One add + one drag.
        s.undo();
        let layer = s.document().layer(id).unwrap();
        assert!((layer.x - 250.0).abs() < f64::EPSILON);
        s.undo();
        assert!(s.document().text_layers.is_empty());
        assert!(!s.can_undo());
    }

    #[test]
    fn test_click_without_move_records_nothing() {
        let mut s = session();
        s.add_text_layer();

        press(&mut s, Point::new(250.0, 250.0));
        release(&mut s, Point::new(250.0, 250.0));

        // Only the add is undoable.
        s.undo();
        assert!(!s.can_undo());
    }

    #[test]
    fn test_click_empty_canvas_clears_selection() {
        let mut s = session();
        s.add_text_layer();
        assert!(s.selection().is_some());

        press(&mut s, Point::new(10.0, 480.0));
        release(&mut s, Point::new(10.0, 480.0));
        assert!(s.selection().is_none());
    }

    #[test]
    fn test_drag_snaps_to_canvas_center() {
        let mut s = session();
        s.add_text_layer();
        let id = s.document().text_layers[0].id;

        press(&mut s, Point::new(250.0, 250.0));
        move_to(&mut s, Point::new(253.0, 150.0));
        let layer = s.document().layer(id).unwrap();
        assert!((layer.x - 250.0).abs() < 1e-9);
        assert!(!s.guides().is_empty());

        release(&mut s, Point::new(253.0, 150.0));
        assert!(s.guides().is_empty());
    }

    #[test]
    fn test_undo_redo_inverse_through_session() {
        let mut s = session();
        s.add_text_layer();
        let before = s.document().clone();
        s.set_filter(Filter::Invert, 0.0);
        let after = s.document().clone();

        s.undo();
        assert_eq!(s.document(), &before);
        s.redo();
        assert_eq!(s.document(), &after);
    }

    #[test]
    fn test_history_bound_through_session() {
        let mut s = session();
        s.add_text_layer();
        // 50 more discrete edits on top of the add.
        for i in 0..52 {
            s.set_filter(Filter::Brighten, (i % 10) as f64 / 10.0);
        }
        let mut undos = 0;
        while s.can_undo() {
            s.undo();
            undos += 1;
        }
        assert_eq!(undos, covercraft_core::MAX_HISTORY);
    }

    #[test]
    fn test_delete_selected() {
        let mut s = session();
        s.add_text_layer();
        s.delete_selected();
        assert!(s.document().text_layers.is_empty());
        assert!(s.selection().is_none());
        // Delete without selection is a no-op.
        s.delete_selected();
    }

    #[test]
    fn test_delete_key() {
        let mut s = session();
        s.add_text_layer();
        s.handle_key_event(KeyEvent::Pressed("Delete".to_string()));
        assert!(s.document().text_layers.is_empty());
    }

    #[test]
    fn test_undo_shortcut() {
        let mut s = session();
        s.add_text_layer();
        s.input.set_modifiers(covercraft_core::Modifiers {
            ctrl: true,
            ..Default::default()
        });
        s.handle_key_event(KeyEvent::Pressed("z".to_string()));
        assert!(s.document().text_layers.is_empty());
        s.input.set_modifiers(covercraft_core::Modifiers {
            ctrl: true,
            shift: true,
            ..Default::default()
        });
        s.handle_key_event(KeyEvent::Pressed("z".to_string()));
        assert_eq!(s.document().text_layers.len(), 1);
    }

    #[test]
    fn test_upload_decode_failure_keeps_state() {
        let mut s = session();
        let before = s.document().clone();
        s.upload_background(b"not an image at all");
        assert_eq!(s.document(), &before);
        let notices = s.take_notices();
        assert!(matches!(notices.as_slice(), [Notice::Error(_)]));
        assert!(!s.can_undo());
    }

    #[test]
    fn test_randomize_design_uses_non_none_filter() {
        let mut s = session();
        s.add_text_layer();
        let mut rng = rand::thread_rng();
        s.randomize_design(&mut rng);
        assert_ne!(s.document().background.filter, Filter::None);
        // Undoable in one step.
        s.undo();
        assert_eq!(s.document().background.filter, Filter::None);
    }

    #[test]
    fn test_reset_design_is_undoable() {
        let mut s = session();
        s.add_text_layer();
        s.set_filter(Filter::Sepia, 0.3);
        s.reset_design();
        assert!(s.document().text_layers.is_empty());
        s.undo();
        assert_eq!(s.document().text_layers.len(), 1);
        assert_eq!(s.document().background.filter, Filter::Sepia);
    }

    #[test]
    fn test_text_editing_commits_once() {
        let mut s = session();
        s.add_text_layer();
        let id = s.document().text_layers[0].id;

        // Double-click on the layer.
        press(&mut s, Point::new(250.0, 250.0));
        release(&mut s, Point::new(250.0, 250.0));
        press(&mut s, Point::new(250.0, 250.0));
        assert!(matches!(s.interaction(), Interaction::EditingText { .. }));

        // Keystrokes edit the draft, not the document.
        s.handle_key_event(KeyEvent::Pressed("Backspace".to_string()));
        s.handle_key_event(KeyEvent::Pressed("!".to_string()));
        assert_eq!(s.document().layer(id).unwrap().text, "Your text");

        s.handle_key_event(KeyEvent::Pressed("Enter".to_string()));
        assert_eq!(s.document().layer(id).unwrap().text, "Your tex!");

        // One undo restores the original text.
        s.undo();
        assert_eq!(s.document().layer(id).unwrap().text, "Your text");
    }

    #[test]
    fn test_escape_cancels_text_editing() {
        let mut s = session();
        s.add_text_layer();
        let id = s.document().text_layers[0].id;

        press(&mut s, Point::new(250.0, 250.0));
        release(&mut s, Point::new(250.0, 250.0));
        press(&mut s, Point::new(250.0, 250.0));
        s.handle_key_event(KeyEvent::Pressed("x".to_string()));
        s.handle_key_event(KeyEvent::Pressed("Escape".to_string()));

        assert_eq!(s.document().layer(id).unwrap().text, "Your text");
        assert!(s.interaction().is_idle());
    }

    #[test]
    fn test_rotation_gesture_normalizes_degrees() {
        let mut s = session();
        s.add_text_layer();
        let id = s.document().text_layers[0].id;
        let layer = s.document().layer(id).unwrap().clone();

        // Grab the rotate handle, then swing the pointer left of center.
        let handles = covercraft_core::handles::layer_handles(&layer);
        let rotate = handles
            .iter()
            .find(|h| h.kind == HandleKind::Rotate)
            .unwrap()
            .position;
        press(&mut s, rotate);
        move_to(&mut s, Point::new(layer.x - 80.0, layer.y));
        release(&mut s, Point::new(layer.x - 80.0, layer.y));

        let rotation = s.document().layer(id).unwrap().rotation;
        assert!((0.0..360.0).contains(&rotation));
        assert!((rotation - 270.0).abs() < 1.0);
    }

    #[test]
    fn test_resize_respects_min_size() {
        let mut s = session();
        s.add_text_layer();
        let id = s.document().text_layers[0].id;
        let layer = s.document().layer(id).unwrap().clone();

        let handles = covercraft_core::handles::layer_handles(&layer);
        let corner = handles[3].position;
        press(&mut s, corner);
        // Collapse toward the center.
        move_to(&mut s, Point::new(layer.x + 1.0, layer.y + 1.0));
        release(&mut s, Point::new(layer.x + 1.0, layer.y + 1.0));

        let resized = s.document().layer(id).unwrap();
        let (w, h) = resized.scaled_size();
        assert!(w >= TextLayer::MIN_SIZE - 1e-9);
        assert!(h >= TextLayer::MIN_SIZE - 1e-9);
    }

    #[test]
    fn test_resize_follows_grabbed_corner() {
        let mut s = session();
        s.add_text_layer();
        let id = s.document().text_layers[0].id;
        let layer = s.document().layer(id).unwrap().clone();

        let handles = covercraft_core::handles::layer_handles(&layer);
        let bottom_right = handles[3].position;
        press(&mut s, bottom_right);
        move_to(&mut s, Point::new(layer.x + 150.0, layer.y + 50.0));
        release(&mut s, Point::new(layer.x + 150.0, layer.y + 50.0));

        let (w, h) = s.document().layer(id).unwrap().scaled_size();
        assert!((w - 300.0).abs() < 1e-9);
        assert!((h - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_past_center_floors_at_min() {
        let mut s = session();
        s.add_text_layer();
        let id = s.document().text_layers[0].id;
        let layer = s.document().layer(id).unwrap().clone();

        // Drag the bottom-right corner deep into the top-left quadrant.
        let handles = covercraft_core::handles::layer_handles(&layer);
        let bottom_right = handles[3].position;
        press(&mut s, bottom_right);
        move_to(&mut s, Point::new(layer.x - 120.0, layer.y - 40.0));
        release(&mut s, Point::new(layer.x - 120.0, layer.y - 40.0));

        let (w, h) = s.document().layer(id).unwrap().scaled_size();
        assert!((w - TextLayer::MIN_SIZE).abs() < 1e-9);
        assert!((h - TextLayer::MIN_SIZE).abs() < 1e-9);
    }

    #[test]
    fn test_export_protocol() {
        let mut s = session();
        s.add_text_layer();

        let first = s.request_export();
        assert!(first.is_some());
        // Requests while in flight replace the queued snapshot.
        s.set_filter(Filter::Sepia, 0.2);
        assert!(s.request_export().is_none());
        s.set_filter(Filter::Blur, 0.9);
        assert!(s.request_export().is_none());

        let next = s.complete_export(Ok(())).unwrap();
        assert_eq!(next.background.filter, Filter::Blur);
        assert!(s.complete_export(Ok(())).is_none());
    }

    #[test]
    fn test_export_shortcut_sets_flag() {
        let mut s = session();
        assert!(!s.take_export_request());
        s.input.set_modifiers(covercraft_core::Modifiers {
            ctrl: true,
            ..Default::default()
        });
        s.handle_key_event(KeyEvent::Pressed("e".to_string()));
        assert!(s.take_export_request());
        // Drained on read.
        assert!(!s.take_export_request());
    }

    #[test]
    fn test_export_failure_raises_notice() {
        let mut s = session();
        let before = s.document().clone();
        let _ = s.request_export();
        let _ = s.complete_export(Err(ExportError::Encoding("boom".to_string())));
        assert_eq!(s.document(), &before);
        let notices = s.take_notices();
        assert!(matches!(notices.as_slice(), [Notice::Error(_)]));
        assert!(!s.can_undo());
    }

    #[test]
    fn test_restore_empty_storage_defaults() {
        let storage = Arc::new(MemoryStorage::new());
        let mut s = EditorSession::new(Arc::clone(&storage));
        block_on(s.restore());
        assert_eq!(s.document(), &Document::new());
    }

    #[test]
    fn test_restore_roundtrip_through_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let mut s = EditorSession::new(Arc::clone(&storage));
        s.add_text_layer();
        block_on(s.flush()).unwrap();
        let expected = s.document().clone();

        let mut s2 = EditorSession::new(storage);
        block_on(s2.restore());
        assert_eq!(s2.document(), &expected);
    }

    #[test]
    fn test_edits_schedule_and_flush_persistence() {
        let storage = Arc::new(MemoryStorage::new());
        let mut s = EditorSession::new(Arc::clone(&storage));
        s.add_text_layer();

        // Nothing written until the debounce fires or a flush happens.
        assert!(!block_on(storage.exists(SNAPSHOT_KEY)).unwrap());
        block_on(s.flush()).unwrap();
        assert!(block_on(storage.exists(SNAPSHOT_KEY)).unwrap());

        let saved: PersistedSnapshot = block_on(storage.load(SNAPSHOT_KEY)).unwrap();
        assert_eq!(saved.text_layers.len(), 1);
    }
}
