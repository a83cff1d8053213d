//! Scene geometry shared by the edit and export surfaces.

use covercraft_core::Color;
use kurbo::Rect;

/// Canvas color behind the background image (and the whole cover when no
/// image is set).
pub const BACKGROUND_COLOR: Color = Color {
    r: 0x1a,
    g: 0x1a,
    b: 0x1a,
    a: 255,
};

/// Selection frame and handle color.
pub const SELECTION_COLOR: Color = Color {
    r: 59,
    g: 130,
    b: 246,
    a: 255,
};

/// Alignment guide color.
pub const GUIDE_COLOR: Color = Color {
    r: 244,
    g: 63,
    b: 94,
    a: 255,
};

/// Cover-fit placement: scale the image so it covers the whole square
/// canvas, centered, cropping the overflow axis.
pub fn cover_fit(canvas_size: f64, image_width: u32, image_height: u32) -> Rect {
    let w = image_width as f64;
    let h = image_height as f64;
    let scale = (canvas_size / w).max(canvas_size / h);
    let fitted_w = w * scale;
    let fitted_h = h * scale;
    let x0 = (canvas_size - fitted_w) / 2.0;
    let y0 = (canvas_size - fitted_h) / 2.0;
    Rect::new(x0, y0, x0 + fitted_w, y0 + fitted_h)
}
