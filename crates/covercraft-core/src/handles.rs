//! Selection and manipulation handles for text layers.

use crate::document::TextLayer;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Handle size in edit units.
pub const HANDLE_SIZE: f64 = 8.0;
/// Handle hit tolerance in edit units.
pub const HANDLE_HIT_TOLERANCE: f64 = 10.0;
/// Distance from the layer's top edge to the rotation handle.
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;

/// Corner positions of the selection frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Sign of the corner offset from center, in local coordinates.
    pub fn signs(self) -> (f64, f64) {
        match self {
            Corner::TopLeft => (-1.0, -1.0),
            Corner::TopRight => (1.0, -1.0),
            Corner::BottomLeft => (-1.0, 1.0),
            Corner::BottomRight => (1.0, 1.0),
        }
    }
}

/// Type of manipulation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner handle for resizing.
    Corner(Corner),
    /// Rotation handle above the top-center.
    Rotate,
}

/// A handle with its position in edit coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= tolerance * tolerance
    }
}

/// Corner handles plus the rotation handle for a layer, positioned on the
/// rotated selection frame (not the AABB).
pub fn layer_handles(layer: &TextLayer) -> Vec<Handle> {
    let (w, h) = layer.scaled_size();
    let half_w = w / 2.0;
    let half_h = h / 2.0;
    let theta = layer.rotation.to_radians();
    let cos_r = theta.cos();
    let sin_r = theta.sin();

    let rotate_point = |dx: f64, dy: f64| -> Point {
        Point::new(
            layer.x + dx * cos_r - dy * sin_r,
            layer.y + dx * sin_r + dy * cos_r,
        )
    };

    vec![
        Handle::new(
            rotate_point(-half_w, -half_h),
            HandleKind::Corner(Corner::TopLeft),
        ),
        Handle::new(
            rotate_point(half_w, -half_h),
            HandleKind::Corner(Corner::TopRight),
        ),
        Handle::new(
            rotate_point(-half_w, half_h),
            HandleKind::Corner(Corner::BottomLeft),
        ),
        Handle::new(
            rotate_point(half_w, half_h),
            HandleKind::Corner(Corner::BottomRight),
        ),
        Handle::new(
            rotate_point(0.0, -half_h - ROTATE_HANDLE_OFFSET),
            HandleKind::Rotate,
        ),
    ]
}

/// Find which handle (if any) is hit at the given point.
pub fn hit_test_handles(layer: &TextLayer, point: Point, tolerance: f64) -> Option<HandleKind> {
    layer_handles(layer)
        .into_iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}
