//! Alignment-guide snapping for drag and resize interactions.

use crate::document::{Document, LayerId};
use kurbo::Rect;

/// Snap activation distance in edit units.
pub const SNAP_THRESHOLD: f64 = 6.0;

/// Axis a guide line runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideAxis {
    /// A vertical line at a fixed x.
    Vertical,
    /// A horizontal line at a fixed y.
    Horizontal,
}

/// What produced a guide. Canvas guides outrank layer guides when both
/// are within the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GuideSource {
    Canvas,
    Layer,
}

/// A transient alignment line for the render overlay. Guides are derived
/// per pointer move and never stored in the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guide {
    pub axis: GuideAxis,
    pub position: f64,
    pub source: GuideSource,
}

/// Result of a snap computation: the adjusted position plus the guides to
/// display for each snapped axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapOutcome {
    pub x: f64,
    pub y: f64,
    pub guides: Vec<Guide>,
}

impl SnapOutcome {
    pub fn is_snapped(&self) -> bool {
        !self.guides.is_empty()
    }
}

/// A single-axis snap candidate line.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    position: f64,
    source: GuideSource,
}

/// Candidate lines for one axis: canvas edges and center, then the AABB
/// edges and center lines of every layer except the dragged one.
fn axis_candidates(
    doc: &Document,
    dragged_id: LayerId,
    axis: GuideAxis,
) -> Vec<Candidate> {
    let mut candidates = vec![
        Candidate {
            position: 0.0,
            source: GuideSource::Canvas,
        },
        Candidate {
            position: doc.canvas_size / 2.0,
            source: GuideSource::Canvas,
        },
        Candidate {
            position: doc.canvas_size,
            source: GuideSource::Canvas,
        },
    ];

    for layer in doc.text_layers.iter().filter(|l| l.id != dragged_id) {
        let bounds = layer.bounds();
        let (lo, hi) = match axis {
            GuideAxis::Vertical => (bounds.x0, bounds.x1),
            GuideAxis::Horizontal => (bounds.y0, bounds.y1),
        };
        for position in [lo, (lo + hi) / 2.0, hi] {
            candidates.push(Candidate {
                position,
                source: GuideSource::Layer,
            });
        }
    }

    candidates
}

/// Find the best candidate within threshold for a set of probe lines
/// (the moving layer's low edge, center, high edge on one axis).
///
/// Returns the offset to add to the proposed position and the matched
/// candidate. Canvas candidates win over layer candidates; among equals
/// the smallest absolute distance wins.
fn best_snap(probes: &[f64], candidates: &[Candidate]) -> Option<(f64, Candidate)> {
    let mut best: Option<(f64, Candidate)> = None;
    for &probe in probes {
        for &candidate in candidates {
            let delta = candidate.position - probe;
            if delta.abs() > SNAP_THRESHOLD {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_delta, best_candidate)) => {
                    match (candidate.source, best_candidate.source) {
                        (GuideSource::Canvas, GuideSource::Layer) => true,
                        (GuideSource::Layer, GuideSource::Canvas) => false,
                        _ => delta.abs() < best_delta.abs(),
                    }
                }
            };
            if better {
                best = Some((delta, candidate));
            }
        }
    }
    best
}

/// Snap a layer drag. The layer's bounds are evaluated at the proposed
/// center; each axis resolves independently. Pure: same inputs, same
/// outcome, and feeding a snapped position back in returns it unchanged.
pub fn compute_snap(
    doc: &Document,
    dragged_id: LayerId,
    proposed_x: f64,
    proposed_y: f64,
) -> SnapOutcome {
    let Some(layer) = doc.layer(dragged_id) else {
        return SnapOutcome {
            x: proposed_x,
            y: proposed_y,
            guides: Vec::new(),
        };
    };

    let bounds = layer.bounds_at(proposed_x, proposed_y);
    let mut outcome = SnapOutcome {
        x: proposed_x,
        y: proposed_y,
        guides: Vec::new(),
    };

    let x_probes = [bounds.x0, (bounds.x0 + bounds.x1) / 2.0, bounds.x1];
    let x_candidates = axis_candidates(doc, dragged_id, GuideAxis::Vertical);
    if let Some((delta, candidate)) = best_snap(&x_probes, &x_candidates) {
        outcome.x = proposed_x + delta;
        outcome.guides.push(Guide {
            axis: GuideAxis::Vertical,
            position: candidate.position,
            source: candidate.source,
        });
    }

    let y_probes = [bounds.y0, (bounds.y0 + bounds.y1) / 2.0, bounds.y1];
    let y_candidates = axis_candidates(doc, dragged_id, GuideAxis::Horizontal);
    if let Some((delta, candidate)) = best_snap(&y_probes, &y_candidates) {
        outcome.y = proposed_y + delta;
        outcome.guides.push(Guide {
            axis: GuideAxis::Horizontal,
            position: candidate.position,
            source: candidate.source,
        });
    }

    outcome
}

/// Result of a resize snap: the adjusted bounds and active guides.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSnapOutcome {
    pub bounds: Rect,
    pub guides: Vec<Guide>,
}

/// Snap a resize by testing the proposed bounding box edges against the
/// same candidate lines. The box is translated, not reshaped, so the
/// resize gesture keeps its aspect decisions.
pub fn compute_resize_snap(
    doc: &Document,
    dragged_id: LayerId,
    proposed_bounds: Rect,
) -> ResizeSnapOutcome {
    let mut outcome = ResizeSnapOutcome {
        bounds: proposed_bounds,
        guides: Vec::new(),
    };

    let x_probes = [proposed_bounds.x0, proposed_bounds.x1];
    let x_candidates = axis_candidates(doc, dragged_id, GuideAxis::Vertical);
    if let Some((delta, candidate)) = best_snap(&x_probes, &x_candidates) {
        outcome.bounds.x0 += delta;
        outcome.bounds.x1 += delta;
        outcome.guides.push(Guide {
            axis: GuideAxis::Vertical,
            position: candidate.position,
            source: candidate.source,
        });
    }

    let y_probes = [proposed_bounds.y0, proposed_bounds.y1];
    let y_candidates = axis_candidates(doc, dragged_id, GuideAxis::Horizontal);
    if let Some((delta, candidate)) = best_snap(&y_probes, &y_candidates) {
        outcome.bounds.y0 += delta;
        outcome.bounds.y1 += delta;
        outcome.guides.push(Guide {
            axis: GuideAxis::Horizontal,
            position: candidate.position,
            source: candidate.source,
        });
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{LayerPatch, TextLayer, CANVAS_SIZE};

    fn doc_with_layer() -> (Document, LayerId) {
        let doc = Document::new().add_text_layer();
        let id = doc.text_layers[0].id;
        (doc, id)
    }

    #[test]
    fn test_center_snap_within_threshold() {
        // Center proposed at 253: 3 units from the canvas center line at 250.
        let (doc, id) = doc_with_layer();
        let outcome = compute_snap(&doc, id, 253.0, 400.0);
        assert!((outcome.x - 250.0).abs() < 1e-9);
        let guide = outcome
            .guides
            .iter()
            .find(|g| g.axis == GuideAxis::Vertical)
            .unwrap();
        assert_eq!(guide.source, GuideSource::Canvas);
        assert!((guide.position - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_boundary() {
        let (doc, id) = doc_with_layer();
        // A center probe exactly 6 from the canvas center line snaps.
        let outcome = compute_snap(&doc, id, 256.0, 250.0);
        assert!((outcome.x - 250.0).abs() < 1e-9);
        // At 7 nothing on the x axis is in range and the position passes
        // through untouched.
        let outcome = compute_snap(&doc, id, 257.0, 250.0);
        assert!((outcome.x - 257.0).abs() < 1e-9);
        assert!(outcome.guides.iter().all(|g| g.axis != GuideAxis::Vertical));
    }

    #[test]
    fn test_snap_is_idempotent() {
        let (doc, id) = doc_with_layer();
        let first = compute_snap(&doc, id, 253.0, 247.0);
        let second = compute_snap(&doc, id, first.x, first.y);
        assert!((second.x - first.x).abs() < 1e-9);
        assert!((second.y - first.y).abs() < 1e-9);
    }

    #[test]
    fn test_axes_resolve_independently() {
        let (doc, id) = doc_with_layer();
        // X within threshold of center, Y far from everything relevant.
        let outcome = compute_snap(&doc, id, 253.0, 180.0);
        assert!((outcome.x - 250.0).abs() < 1e-9);
        assert_eq!(outcome.guides.len(), 1);
        assert_eq!(outcome.guides[0].axis, GuideAxis::Vertical);
    }

    #[test]
    fn test_canvas_beats_layer_guide() {
        let mut doc = Document::new().add_text_layer().add_text_layer();
        let dragged = doc.text_layers[0].id;
        let other = doc.text_layers[1].id;
        // Park the other layer so its center line sits 1 unit from the
        // canvas center line; both are then within range of the drag.
        doc = doc.update_layer(other, LayerPatch::position(249.0, 100.0));
        let outcome = compute_snap(&doc, dragged, 252.0, 300.0);
        let guide = outcome
            .guides
            .iter()
            .find(|g| g.axis == GuideAxis::Vertical)
            .unwrap();
        assert_eq!(guide.source, GuideSource::Canvas);
        assert!((outcome.x - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_layer_edge_snap() {
        let mut doc = Document::new().add_text_layer().add_text_layer();
        let dragged = doc.text_layers[0].id;
        let other = doc.text_layers[1].id;
        doc = doc.update_layer(other, LayerPatch::position(120.0, 120.0));
        let other_bounds = doc.layer(other).unwrap().bounds();

        // Propose the dragged center so its left edge lands 3 units from the
        // other layer's right edge.
        let dragged_layer = doc.layer(dragged).unwrap();
        let half_w = dragged_layer.scaled_size().0 / 2.0;
        let proposed_x = other_bounds.x1 + half_w + 3.0;
        let outcome = compute_snap(&doc, dragged, proposed_x, 120.0);
        let snapped_bounds = doc.layer(dragged).unwrap().bounds_at(outcome.x, outcome.y);
        assert!((snapped_bounds.x0 - other_bounds.x1).abs() < 1e-9);
    }

    #[test]
    fn test_missing_layer_passes_through() {
        let doc = Document::new();
        let outcome = compute_snap(&doc, uuid::Uuid::new_v4(), 123.0, 456.0);
        assert!((outcome.x - 123.0).abs() < 1e-9);
        assert!((outcome.y - 456.0).abs() < 1e-9);
        assert!(!outcome.is_snapped());
    }

    #[test]
    fn test_resize_snap_translates_bounds() {
        let (doc, id) = doc_with_layer();
        let proposed = Rect::new(100.0, 100.0, 253.0, 200.0);
        let outcome = compute_resize_snap(&doc, id, proposed);
        // Right edge 3 from the canvas center line pulls the whole box.
        assert!((outcome.bounds.x1 - 250.0).abs() < 1e-9);
        assert!((outcome.bounds.x0 - 97.0).abs() < 1e-9);
        assert!((outcome.bounds.width() - proposed.width()).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_layer_snaps_on_aabb() {
        let mut doc = Document::new().add_text_layer();
        let id = doc.text_layers[0].id;
        doc = doc.update_layer(id, LayerPatch::rotation(30.0));
        let layer = doc.layer(id).unwrap();
        let half_w = layer.bounds().width() / 2.0;
        // Left AABB edge proposed 4 units right of the canvas left edge.
        let proposed_x = half_w + 4.0;
        let outcome = compute_snap(&doc, id, proposed_x, CANVAS_SIZE / 2.0);
        let bounds = layer.bounds_at(outcome.x, CANVAS_SIZE / 2.0);
        assert!((bounds.x0 - 0.0).abs() < 1e-9);
        let mut layer_check = TextLayer::new(CANVAS_SIZE);
        layer_check.rotation = 30.0;
        assert!(layer_check.bounds().width() > layer_check.scaled_size().0);
    }
}
