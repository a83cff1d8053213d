//! CPU raster renderer for the edit surface and the export surface.
//!
//! Both surfaces draw the same scene graph; `render_scaled` multiplies
//! every geometric value by the surface scale instead of upscaling the
//! edit raster, so exports are re-rasterized at full resolution.

use crate::filters::FilterCache;
use crate::fonts::FontStore;
use crate::scene::{cover_fit, BACKGROUND_COLOR, GUIDE_COLOR, SELECTION_COLOR};
use covercraft_core::handles::{layer_handles, HandleKind, HANDLE_SIZE};
use covercraft_core::{Color, Document, Guide, GuideAxis, LayerId, TextLayer};
use image::{Rgba, RgbaImage};
use kurbo::{Point, Rect};

/// Transient UI drawn on top of the edit surface. Export rendering takes
/// no overlay.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    pub selection: Option<LayerId>,
    pub guides: Vec<Guide>,
}

/// CPU renderer owning the font store and the filter cache.
pub struct RasterRenderer {
    fonts: FontStore,
    filters: FilterCache,
}

impl RasterRenderer {
    pub fn new(fonts: FontStore) -> Self {
        Self {
            fonts,
            filters: FilterCache::new(),
        }
    }

    pub fn fonts_mut(&mut self) -> &mut FontStore {
        &mut self.fonts
    }

    /// Render the edit surface at 1:1 edit resolution.
    pub fn render_edit(&mut self, doc: &Document, overlay: Option<&Overlay>) -> RgbaImage {
        self.render_scaled(doc, 1.0, overlay)
    }

    /// Render the scene at an arbitrary scale factor.
    pub fn render_scaled(
        &mut self,
        doc: &Document,
        scale: f64,
        overlay: Option<&Overlay>,
    ) -> RgbaImage {
        let size = (doc.canvas_size * scale).round().max(1.0) as u32;
        let mut surface = RgbaImage::from_pixel(
            size,
            size,
            Rgba([
                BACKGROUND_COLOR.r,
                BACKGROUND_COLOR.g,
                BACKGROUND_COLOR.b,
                255,
            ]),
        );

        self.draw_background(&mut surface, doc, scale);

        for layer in &doc.text_layers {
            self.draw_text_layer(&mut surface, layer, scale);
        }

        if let Some(overlay) = overlay {
            self.draw_overlay(&mut surface, doc, overlay, scale);
        }

        surface
    }

    /// Filter the background at source resolution, then sample the
    /// filtered buffer into the cover-fit rectangle.
    fn draw_background(&mut self, surface: &mut RgbaImage, doc: &Document, scale: f64) {
        let Some(source) = doc.background.image.as_deref() else {
            return;
        };
        // Entries for replaced backgrounds are dead weight.
        self.filters.retain_token(source.token());
        let filtered = self.filters.filtered(
            source.token(),
            source.pixels(),
            doc.background.filter,
            doc.background.filter_intensity,
        );

        let placement = cover_fit(doc.canvas_size, source.width(), source.height());
        let dest = Rect::new(
            placement.x0 * scale,
            placement.y0 * scale,
            placement.x1 * scale,
            placement.y1 * scale,
        );

        let (surf_w, surf_h) = surface.dimensions();
        let x_start = dest.x0.max(0.0).floor() as u32;
        let y_start = dest.y0.max(0.0).floor() as u32;
        let x_end = dest.x1.min(surf_w as f64).ceil() as u32;
        let y_end = dest.y1.min(surf_h as f64).ceil() as u32;

        let src_w = filtered.width() as f64;
        let src_h = filtered.height() as f64;

        for y in y_start..y_end {
            for x in x_start..x_end {
                let u = ((x as f64 + 0.5) - dest.x0) / dest.width() * src_w;
                let v = ((y as f64 + 0.5) - dest.y0) / dest.height() * src_h;
                let pixel = sample_bilinear(&filtered, u, v);
                surface.put_pixel(x, y, Rgba(pixel));
            }
        }
    }

    /// Rasterize a text layer and composite it with the layer's rotation
    /// and scale applied. A missing font degrades to a placeholder frame.
    fn draw_text_layer(&mut self, surface: &mut RgbaImage, layer: &TextLayer, scale: f64) {
        let face = self.fonts.face(layer.font_family, layer.font_weight);
        let mask = match face {
            Some(face) => rasterize_text_mask(&face, layer, scale),
            None => placeholder_mask(layer, scale),
        };
        composite_mask(surface, &mask, layer, scale);
    }

    fn draw_overlay(
        &mut self,
        surface: &mut RgbaImage,
        doc: &Document,
        overlay: &Overlay,
        scale: f64,
    ) {
        for guide in &overlay.guides {
            let position = guide.position * scale;
            let extent = doc.canvas_size * scale;
            match guide.axis {
                GuideAxis::Vertical => {
                    draw_line(surface, Point::new(position, 0.0), Point::new(position, extent), GUIDE_COLOR);
                }
                GuideAxis::Horizontal => {
                    draw_line(surface, Point::new(0.0, position), Point::new(extent, position), GUIDE_COLOR);
                }
            }
        }

        let Some(selected) = overlay.selection.and_then(|id| doc.layer(id)) else {
            return;
        };

        // Rotated selection frame through the corner handle positions.
        let handles = layer_handles(selected);
        let corners: Vec<Point> = handles
            .iter()
            .filter(|h| matches!(h.kind, HandleKind::Corner(_)))
            .map(|h| Point::new(h.position.x * scale, h.position.y * scale))
            .collect();
        if corners.len() == 4 {
            // Handle order: TL, TR, BL, BR.
            draw_line(surface, corners[0], corners[1], SELECTION_COLOR);
            draw_line(surface, corners[1], corners[3], SELECTION_COLOR);
            draw_line(surface, corners[3], corners[2], SELECTION_COLOR);
            draw_line(surface, corners[2], corners[0], SELECTION_COLOR);
        }

        let half = HANDLE_SIZE * scale / 2.0;
        for handle in &handles {
            let center = Point::new(handle.position.x * scale, handle.position.y * scale);
            fill_rect(
                surface,
                Rect::new(
                    center.x - half,
                    center.y - half,
                    center.x + half,
                    center.y + half,
                ),
                SELECTION_COLOR,
            );
        }
    }
}

/// Grayscale coverage mask plus its center offset in surface pixels.
struct TextMask {
    coverage: Vec<u8>,
    width: u32,
    height: u32,
}

/// Lay out and rasterize the text block at `font_size * scale` pixels.
/// The mask is unrotated and unscaled by the layer transform; the
/// composite step applies both.
fn rasterize_text_mask(face: &fontdue::Font, layer: &TextLayer, scale: f64) -> TextMask {
    let px_size = (layer.font_size * scale) as f32;
    let line_height = (layer.font_size * 1.2 * scale).ceil();
    let lines: Vec<&str> = if layer.text.is_empty() {
        vec![""]
    } else {
        layer.text.lines().collect()
    };

    let line_widths: Vec<f64> = lines
        .iter()
        .map(|line| {
            line.chars()
                .map(|c| face.metrics(c, px_size).advance_width as f64)
                .sum()
        })
        .collect();
    let block_w = line_widths.iter().cloned().fold(1.0f64, f64::max).ceil() as u32;
    let block_h = (line_height * lines.len() as f64).ceil() as u32;

    let ascent = face
        .horizontal_line_metrics(px_size)
        .map(|m| m.ascent as f64)
        .unwrap_or(px_size as f64 * 0.8);

    let mut coverage = vec![0u8; (block_w * block_h) as usize];
    for (i, line) in lines.iter().enumerate() {
        let mut cursor = (block_w as f64 - line_widths[i]) / 2.0;
        let baseline = i as f64 * line_height + ascent;
        for c in line.chars() {
            let (metrics, bitmap) = face.rasterize(c, px_size);
            let glyph_x = (cursor + metrics.xmin as f64).round() as i64;
            let glyph_top = (baseline - metrics.height as f64 - metrics.ymin as f64).round() as i64;
            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let dx = glyph_x + gx as i64;
                    let dy = glyph_top + gy as i64;
                    if dx < 0 || dy < 0 || dx >= block_w as i64 || dy >= block_h as i64 {
                        continue;
                    }
                    let idx = (dy as u32 * block_w + dx as u32) as usize;
                    let value = bitmap[gy * metrics.width + gx];
                    coverage[idx] = coverage[idx].max(value);
                }
            }
            cursor += metrics.advance_width as f64;
        }
    }

    TextMask {
        coverage,
        width: block_w,
        height: block_h,
    }
}

/// A rectangular frame standing in for unresolvable fonts. Sized from the
/// layer's approximate metrics so layout stays stable.
fn placeholder_mask(layer: &TextLayer, scale: f64) -> TextMask {
    let (base_w, base_h) = layer.base_size();
    let width = (base_w * scale).ceil().max(2.0) as u32;
    let height = (base_h * scale).ceil().max(2.0) as u32;
    let border = (2.0 * scale).ceil().max(1.0) as u32;

    let mut coverage = vec![0u8; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let on_edge =
                x < border || y < border || x >= width - border || y >= height - border;
            if on_edge {
                coverage[(y * width + x) as usize] = 255;
            }
        }
    }
    TextMask {
        coverage,
        width,
        height,
    }
}

/// Composite a mask centered on the layer position with rotation and the
/// layer's scale factors, by inverse-mapping destination pixels into mask
/// space and sampling bilinearly.
fn composite_mask(surface: &mut RgbaImage, mask: &TextMask, layer: &TextLayer, scale: f64) {
    if layer.scale_x <= 0.0 || layer.scale_y <= 0.0 {
        return;
    }
    let center_x = layer.x * scale;
    let center_y = layer.y * scale;
    let theta = layer.rotation.to_radians();
    let cos_r = theta.cos();
    let sin_r = theta.sin();

    // Destination AABB of the transformed mask.
    let half_w = mask.width as f64 / 2.0 * layer.scale_x;
    let half_h = mask.height as f64 / 2.0 * layer.scale_y;
    let aabb_w = half_w * cos_r.abs() + half_h * sin_r.abs();
    let aabb_h = half_w * sin_r.abs() + half_h * cos_r.abs();

    let (surf_w, surf_h) = surface.dimensions();
    let x_start = (center_x - aabb_w).floor().max(0.0) as u32;
    let y_start = (center_y - aabb_h).floor().max(0.0) as u32;
    let x_end = ((center_x + aabb_w).ceil() as u32).min(surf_w);
    let y_end = ((center_y + aabb_h).ceil() as u32).min(surf_h);

    let color = layer.color;
    for y in y_start..y_end {
        for x in x_start..x_end {
            let dx = x as f64 + 0.5 - center_x;
            let dy = y as f64 + 0.5 - center_y;
            // Inverse rotation, then inverse scale.
            let local_x = (dx * cos_r + dy * sin_r) / layer.scale_x;
            let local_y = (-dx * sin_r + dy * cos_r) / layer.scale_y;
            let mx = local_x + mask.width as f64 / 2.0;
            let my = local_y + mask.height as f64 / 2.0;
            let alpha = sample_mask_bilinear(mask, mx, my);
            if alpha == 0 {
                continue;
            }
            blend_pixel(surface, x, y, color, alpha);
        }
    }
}

fn sample_mask_bilinear(mask: &TextMask, x: f64, y: f64) -> u8 {
    if x < -1.0 || y < -1.0 || x > mask.width as f64 || y > mask.height as f64 {
        return 0;
    }
    let x0 = (x - 0.5).floor();
    let y0 = (y - 0.5).floor();
    let fx = x - 0.5 - x0;
    let fy = y - 0.5 - y0;

    let fetch = |ix: f64, iy: f64| -> f64 {
        if ix < 0.0 || iy < 0.0 || ix >= mask.width as f64 || iy >= mask.height as f64 {
            0.0
        } else {
            mask.coverage[(iy as u32 * mask.width + ix as u32) as usize] as f64
        }
    };

    let value = fetch(x0, y0) * (1.0 - fx) * (1.0 - fy)
        + fetch(x0 + 1.0, y0) * fx * (1.0 - fy)
        + fetch(x0, y0 + 1.0) * (1.0 - fx) * fy
        + fetch(x0 + 1.0, y0 + 1.0) * fx * fy;
    value.round().clamp(0.0, 255.0) as u8
}

fn sample_bilinear(source: &RgbaImage, x: f64, y: f64) -> [u8; 4] {
    let max_x = source.width() as f64 - 1.0;
    let max_y = source.height() as f64 - 1.0;
    let x = (x - 0.5).clamp(0.0, max_x);
    let y = (y - 0.5).clamp(0.0, max_y);
    let x0 = x.floor();
    let y0 = y.floor();
    let x1 = (x0 + 1.0).min(max_x);
    let y1 = (y0 + 1.0).min(max_y);
    let fx = x - x0;
    let fy = y - y0;

    let p00 = source.get_pixel(x0 as u32, y0 as u32).0;
    let p10 = source.get_pixel(x1 as u32, y0 as u32).0;
    let p01 = source.get_pixel(x0 as u32, y1 as u32).0;
    let p11 = source.get_pixel(x1 as u32, y1 as u32).0;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let v = p00[c] as f64 * (1.0 - fx) * (1.0 - fy)
            + p10[c] as f64 * fx * (1.0 - fy)
            + p01[c] as f64 * (1.0 - fx) * fy
            + p11[c] as f64 * fx * fy;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

fn blend_pixel(surface: &mut RgbaImage, x: u32, y: u32, color: Color, alpha: u8) {
    let src_a = alpha as f64 / 255.0 * color.a as f64 / 255.0;
    if src_a <= 0.0 {
        return;
    }
    let dst = surface.get_pixel(x, y).0;
    let blend = |s: u8, d: u8| -> u8 {
        (s as f64 * src_a + d as f64 * (1.0 - src_a))
            .round()
            .clamp(0.0, 255.0) as u8
    };
    surface.put_pixel(
        x,
        y,
        Rgba([
            blend(color.r, dst[0]),
            blend(color.g, dst[1]),
            blend(color.b, dst[2]),
            255,
        ]),
    );
}

/// One-pixel line drawn by parametric sampling.
fn draw_line(surface: &mut RgbaImage, from: Point, to: Point, color: Color) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
    let (surf_w, surf_h) = surface.dimensions();
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = from.x + dx * t;
        let y = from.y + dy * t;
        if x < 0.0 || y < 0.0 {
            continue;
        }
        let (px, py) = (x as u32, y as u32);
        if px < surf_w && py < surf_h {
            surface.put_pixel(px, py, Rgba([color.r, color.g, color.b, 255]));
        }
    }
}

fn fill_rect(surface: &mut RgbaImage, rect: Rect, color: Color) {
    let (surf_w, surf_h) = surface.dimensions();
    let x_start = rect.x0.max(0.0) as u32;
    let y_start = rect.y0.max(0.0) as u32;
    let x_end = (rect.x1.ceil() as u32).min(surf_w);
    let y_end = (rect.y1.ceil() as u32).min(surf_h);
    for y in y_start..y_end {
        for x in x_start..x_end {
            surface.put_pixel(x, y, Rgba([color.r, color.g, color.b, 255]));
        }
    }
}
