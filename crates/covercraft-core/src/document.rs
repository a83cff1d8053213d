//! Cover document: background layer, ordered text layers, pure mutators.

use crate::image_source::ImageSource;
use kurbo::Rect;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Edit-time canvas dimension (square, in edit units).
pub const CANVAS_SIZE: f64 = 500.0;
/// Multiplier from edit-time units to export pixels (3000 px output).
pub const EXPORT_SCALE: f64 = 6.0;

/// Stable layer identifier, assigned at creation and never reused.
pub type LayerId = Uuid;

/// RGBA color with hex parsing, serializable for the snapshot schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Returns None on malformed input.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?.trim();
        // Byte slicing below requires char boundaries at every index.
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 | 8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = if hex.len() == 8 {
                    u8::from_str_radix(&hex[6..8], 16).ok()?
                } else {
                    255
                };
                Some(Self::new(r, g, b, a))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Background image filter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    None,
    Grayscale,
    Sepia,
    Brighten,
    Contrast,
    Blur,
    Invert,
}

impl Filter {
    /// Whether the filter has a continuous `[0,1]` intensity parameter.
    pub fn has_intensity(self) -> bool {
        matches!(self, Filter::Brighten | Filter::Contrast | Filter::Blur)
    }

    /// Display name for UI.
    pub fn display_name(self) -> &'static str {
        match self {
            Filter::None => "None",
            Filter::Grayscale => "Grayscale",
            Filter::Sepia => "Sepia",
            Filter::Brighten => "Brightness",
            Filter::Contrast => "Contrast",
            Filter::Blur => "Blur",
            Filter::Invert => "Invert",
        }
    }

    /// All selectable filters, `None` first.
    pub fn all() -> &'static [Filter] {
        &[
            Filter::None,
            Filter::Grayscale,
            Filter::Sepia,
            Filter::Brighten,
            Filter::Contrast,
            Filter::Blur,
            Filter::Invert,
        ]
    }
}

/// Font family options (the product's cover fonts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontFamily {
    Roboto,
    Montserrat,
    Oswald,
    #[default]
    Anton,
    BebasNeue,
}

impl FontFamily {
    /// Font family name as known to the font database.
    pub fn name(self) -> &'static str {
        match self {
            FontFamily::Roboto => "Roboto",
            FontFamily::Montserrat => "Montserrat",
            FontFamily::Oswald => "Oswald",
            FontFamily::Anton => "Anton",
            FontFamily::BebasNeue => "Bebas Neue",
        }
    }

    pub fn all() -> &'static [FontFamily] {
        &[
            FontFamily::Roboto,
            FontFamily::Montserrat,
            FontFamily::Oswald,
            FontFamily::Anton,
            FontFamily::BebasNeue,
        ]
    }

    /// Average glyph advance as a fraction of the font size.
    /// Empirical approximations used for bounds before real layout runs.
    fn char_width_factor(self) -> f64 {
        match self {
            // Anton and Bebas Neue are condensed display faces
            FontFamily::Anton => 0.46,
            FontFamily::BebasNeue => 0.42,
            FontFamily::Oswald => 0.48,
            FontFamily::Roboto => 0.52,
            FontFamily::Montserrat => 0.56,
        }
    }
}

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

impl FontWeight {
    pub fn display_name(self) -> &'static str {
        match self {
            FontWeight::Regular => "Regular",
            FontWeight::Bold => "Bold",
        }
    }

    pub fn all() -> &'static [FontWeight] {
        &[FontWeight::Regular, FontWeight::Bold]
    }
}

/// A movable, rotatable, resizable text element of the composition.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    pub id: LayerId,
    /// Content (may be empty; renders as a zero-content placeholder).
    pub text: String,
    pub font_family: FontFamily,
    /// Font size in edit units.
    pub font_size: f64,
    pub color: Color,
    pub font_weight: FontWeight,
    /// Center position in edit units.
    pub x: f64,
    pub y: f64,
    /// Rotation in degrees, normalized to `[0, 360)`.
    pub rotation: f64,
    /// Independent non-negative scale factors.
    pub scale_x: f64,
    pub scale_y: f64,
}

impl TextLayer {
    /// Default font size for new layers.
    pub const DEFAULT_FONT_SIZE: f64 = 48.0;
    /// Minimum layer extent kept by resize operations, in edit units.
    pub const MIN_SIZE: f64 = 20.0;

    /// Create a layer with default geometry centered on the canvas.
    pub fn new(canvas_size: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: "Your text".to_string(),
            font_family: FontFamily::default(),
            font_size: Self::DEFAULT_FONT_SIZE,
            color: Color::white(),
            font_weight: FontWeight::default(),
            x: canvas_size / 2.0,
            y: canvas_size / 2.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Unscaled, unrotated text block size, approximated from character
    /// counts. The renderer replaces this with real layout at draw time;
    /// these bounds only drive snapping and handle placement.
    pub fn base_size(&self) -> (f64, f64) {
        let max_line_len = self.text.lines().map(str::len).max().unwrap_or(0);
        let line_count = self.text.lines().count().max(1);
        let mut factor = self.font_family.char_width_factor();
        if self.font_weight == FontWeight::Bold {
            factor += 0.03;
        }
        let width = (max_line_len as f64 * self.font_size * factor).max(Self::MIN_SIZE);
        let height = (line_count as f64 * self.font_size * 1.2).max(Self::MIN_SIZE);
        (width, height)
    }

    /// Scaled size before rotation.
    pub fn scaled_size(&self) -> (f64, f64) {
        let (w, h) = self.base_size();
        (w * self.scale_x, h * self.scale_y)
    }

    /// Axis-aligned bounding box of the rotated, scaled rectangle,
    /// centered at the layer position.
    pub fn bounds(&self) -> Rect {
        self.bounds_at(self.x, self.y)
    }

    /// Bounds the layer would have if its center were at `(x, y)`.
    pub fn bounds_at(&self, x: f64, y: f64) -> Rect {
        let (w, h) = self.scaled_size();
        let theta = self.rotation.to_radians();
        let aabb_w = w * theta.cos().abs() + h * theta.sin().abs();
        let aabb_h = w * theta.sin().abs() + h * theta.cos().abs();
        Rect::new(
            x - aabb_w / 2.0,
            y - aabb_h / 2.0,
            x + aabb_w / 2.0,
            y + aabb_h / 2.0,
        )
    }

    /// Hit test against the bounding box.
    pub fn hit_test(&self, point: kurbo::Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }
}

/// Partial update applied to a text layer; unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerPatch {
    pub text: Option<String>,
    pub font_family: Option<FontFamily>,
    pub font_size: Option<f64>,
    pub color: Option<Color>,
    pub font_weight: Option<FontWeight>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rotation: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
}

impl LayerPatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn rotation(degrees: f64) -> Self {
        Self {
            rotation: Some(degrees),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Normalize an angle in degrees to `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees % 360.0;
    if normalized < 0.0 {
        normalized + 360.0
    } else {
        normalized
    }
}

/// The background photo with its active filter.
#[derive(Debug, Clone, Default)]
pub struct BackgroundLayer {
    /// Decoded raster source, shared with the render cache. Absent until an
    /// image is chosen.
    pub image: Option<Arc<ImageSource>>,
    pub filter: Filter,
    /// Normalized `[0,1]`; ignored by parameterless filters.
    pub filter_intensity: f64,
}

impl PartialEq for BackgroundLayer {
    fn eq(&self, other: &Self) -> bool {
        // Sources compare by content token; pixel buffers are never compared.
        self.image.as_deref().map(ImageSource::token) == other.image.as_deref().map(ImageSource::token)
            && self.filter == other.filter
            && self.filter_intensity == other.filter_intensity
    }
}

/// The root aggregate: one background plus ordered text layers
/// (vector order is paint order, back to front).
///
/// Mutators are pure: each returns a new `Document`, which makes history
/// snapshotting trivially correct. Selection is not part of the document;
/// it lives in the editor session.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub canvas_size: f64,
    pub export_scale: f64,
    pub background: BackgroundLayer,
    pub text_layers: Vec<TextLayer>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            canvas_size: CANVAS_SIZE,
            export_scale: EXPORT_SCALE,
            background: BackgroundLayer::default(),
            text_layers: Vec::new(),
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output raster dimension in pixels.
    pub fn export_size(&self) -> u32 {
        (self.canvas_size * self.export_scale).round() as u32
    }

    pub fn layer(&self, id: LayerId) -> Option<&TextLayer> {
        self.text_layers.iter().find(|l| l.id == id)
    }

    pub fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.text_layers.iter().position(|l| l.id == id)
    }

    /// Append a default text layer centered on the canvas. The new layer is
    /// the last element of the returned document.
    pub fn add_text_layer(&self) -> Document {
        let mut doc = self.clone();
        doc.text_layers.push(TextLayer::new(self.canvas_size));
        doc
    }

    /// Apply a patch to a layer. A missing id is a recoverable condition:
    /// the document is returned unchanged.
    pub fn update_layer(&self, id: LayerId, patch: LayerPatch) -> Document {
        let mut doc = self.clone();
        if let Some(layer) = doc.text_layers.iter_mut().find(|l| l.id == id) {
            if let Some(text) = patch.text {
                layer.text = text;
            }
            if let Some(family) = patch.font_family {
                layer.font_family = family;
            }
            if let Some(size) = patch.font_size {
                layer.font_size = size.max(1.0);
            }
            if let Some(color) = patch.color {
                layer.color = color;
            }
            if let Some(weight) = patch.font_weight {
                layer.font_weight = weight;
            }
            if let Some(x) = patch.x {
                layer.x = x;
            }
            if let Some(y) = patch.y {
                layer.y = y;
            }
            if let Some(rotation) = patch.rotation {
                layer.rotation = normalize_degrees(rotation);
            }
            if let Some(sx) = patch.scale_x {
                layer.scale_x = sx.max(0.0);
            }
            if let Some(sy) = patch.scale_y {
                layer.scale_y = sy.max(0.0);
            }
        }
        doc
    }

    /// Remove a layer; no-op if the id is not found.
    pub fn remove_layer(&self, id: LayerId) -> Document {
        let mut doc = self.clone();
        doc.text_layers.retain(|l| l.id != id);
        doc
    }

    /// Move a layer to `new_index` in paint order, clamped to the valid
    /// range. No-op if the id is not found.
    pub fn reorder_layer(&self, id: LayerId, new_index: usize) -> Document {
        let mut doc = self.clone();
        if let Some(current) = doc.text_layers.iter().position(|l| l.id == id) {
            let layer = doc.text_layers.remove(current);
            let clamped = new_index.min(doc.text_layers.len());
            doc.text_layers.insert(clamped, layer);
        }
        doc
    }

    pub fn set_background_image(&self, source: Arc<ImageSource>) -> Document {
        let mut doc = self.clone();
        doc.background.image = Some(source);
        doc
    }

    pub fn clear_background_image(&self) -> Document {
        let mut doc = self.clone();
        doc.background.image = None;
        doc
    }

    /// Select a filter; intensity is clamped to `[0,1]`.
    pub fn set_filter(&self, filter: Filter, intensity: f64) -> Document {
        let mut doc = self.clone();
        doc.background.filter = filter;
        doc.background.filter_intensity = intensity.clamp(0.0, 1.0);
        doc
    }

    /// Topmost layer whose bounds contain the point, if any.
    pub fn layer_at_point(&self, point: kurbo::Point, tolerance: f64) -> Option<LayerId> {
        self.text_layers
            .iter()
            .rev()
            .find(|l| l.hit_test(point, tolerance))
            .map(|l| l.id)
    }

    /// Randomized variation: a random non-None filter and shuffled text
    /// geometry, keeping content and colors.
    pub fn randomized<R: Rng>(&self, rng: &mut R) -> Document {
        let mut doc = self.clone();
        let filters = Filter::all();
        doc.background.filter = filters[rng.gen_range(1..filters.len())];
        doc.background.filter_intensity = rng.gen_range(0.3..0.8);

        let margin = 50.0;
        for layer in &mut doc.text_layers {
            layer.x = rng.gen_range(margin..self.canvas_size - margin);
            layer.y = rng.gen_range(margin..self.canvas_size - margin);
            let families = FontFamily::all();
            layer.font_family = families[rng.gen_range(0..families.len())];
            layer.rotation = normalize_degrees(rng.gen_range(-15.0..15.0));
            layer.font_size = rng.gen_range(32.0..72.0);
        }
        doc
    }
}
