//! Background image filters.
//!
//! Filters always run against the full-resolution source; scaling happens
//! afterwards, so the exported image matches the edit preview regardless of
//! surface resolution.

use covercraft_core::Filter;
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::sync::Arc;

/// Blur radius in source pixels at intensity 1.0.
pub const MAX_BLUR_RADIUS: f64 = 20.0;

/// Apply a filter to an image, returning a new buffer. The source is
/// never mutated. Intensity is clamped to `[0,1]` and ignored by the
/// parameterless filters.
pub fn apply_filter(source: &RgbaImage, filter: Filter, intensity: f64) -> RgbaImage {
    let intensity = intensity.clamp(0.0, 1.0);
    match filter {
        Filter::None => source.clone(),
        Filter::Grayscale => map_pixels(source, |[r, g, b, a]| {
            let luma = 0.34 * r as f64 + 0.5 * g as f64 + 0.16 * b as f64;
            let v = clamp_channel(luma);
            [v, v, v, a]
        }),
        Filter::Sepia => map_pixels(source, |[r, g, b, a]| {
            let (rf, gf, bf) = (r as f64, g as f64, b as f64);
            [
                clamp_channel(0.393 * rf + 0.769 * gf + 0.189 * bf),
                clamp_channel(0.349 * rf + 0.686 * gf + 0.168 * bf),
                clamp_channel(0.272 * rf + 0.534 * gf + 0.131 * bf),
                a,
            ]
        }),
        Filter::Invert => map_pixels(source, |[r, g, b, a]| [255 - r, 255 - g, 255 - b, a]),
        Filter::Brighten => {
            let offset = intensity * 255.0;
            map_pixels(source, |[r, g, b, a]| {
                [
                    clamp_channel(r as f64 + offset),
                    clamp_channel(g as f64 + offset),
                    clamp_channel(b as f64 + offset),
                    a,
                ]
            })
        }
        Filter::Contrast => {
            // Steepening around the midpoint, quadratic in intensity.
            let adjust = ((intensity * 100.0 + 100.0) / 100.0).powi(2);
            map_pixels(source, |[r, g, b, a]| {
                let apply = |c: u8| {
                    clamp_channel(((c as f64 / 255.0 - 0.5) * adjust + 0.5) * 255.0)
                };
                [apply(r), apply(g), apply(b), a]
            })
        }
        Filter::Blur => {
            let radius = (intensity * MAX_BLUR_RADIUS).round() as u32;
            box_blur(source, radius)
        }
    }
}

fn clamp_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn map_pixels(source: &RgbaImage, f: impl Fn([u8; 4]) -> [u8; 4]) -> RgbaImage {
    let mut out = RgbaImage::new(source.width(), source.height());
    for (src, dst) in source.pixels().zip(out.pixels_mut()) {
        *dst = Rgba(f(src.0));
    }
    out
}

/// Separable box blur. Horizontal then vertical pass, each averaging a
/// window of `2 * radius + 1` samples with edge clamping.
fn box_blur(source: &RgbaImage, radius: u32) -> RgbaImage {
    if radius == 0 {
        return source.clone();
    }
    let horizontal = blur_pass(source, radius, true);
    blur_pass(&horizontal, radius, false)
}

fn blur_pass(source: &RgbaImage, radius: u32, horizontal: bool) -> RgbaImage {
    let (width, height) = source.dimensions();
    let mut out = RgbaImage::new(width, height);
    let radius = radius as i64;
    let window = (2 * radius + 1) as f64;

    for y in 0..height {
        for x in 0..width {
            let mut acc = [0.0f64; 4];
            for offset in -radius..=radius {
                let (sx, sy) = if horizontal {
                    (
                        (x as i64 + offset).clamp(0, width as i64 - 1) as u32,
                        y,
                    )
                } else {
                    (
                        x,
                        (y as i64 + offset).clamp(0, height as i64 - 1) as u32,
                    )
                };
                let pixel = source.get_pixel(sx, sy).0;
                for (a, &c) in acc.iter_mut().zip(pixel.iter()) {
                    *a += c as f64;
                }
            }
            let pixel = [
                clamp_channel(acc[0] / window),
                clamp_channel(acc[1] / window),
                clamp_channel(acc[2] / window),
                clamp_channel(acc[3] / window),
            ];
            out.put_pixel(x, y, Rgba(pixel));
        }
    }
    out
}

/// Cache key: source token plus filter and quantized intensity. Intensity
/// is forced to zero bits for parameterless filters so `Grayscale` at any
/// slider position is one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FilterKey {
    token: String,
    filter: Filter,
    intensity_bits: u64,
}

impl FilterKey {
    fn new(token: &str, filter: Filter, intensity: f64) -> Self {
        let intensity_bits = if filter.has_intensity() {
            intensity.clamp(0.0, 1.0).to_bits()
        } else {
            0
        };
        Self {
            token: token.to_string(),
            filter,
            intensity_bits,
        }
    }
}

/// Memoizes filtered full-resolution buffers so pointer-driven rerenders
/// don't refilter an unchanged background.
#[derive(Debug, Default)]
pub struct FilterCache {
    entries: HashMap<FilterKey, Arc<RgbaImage>>,
}

impl FilterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the filtered buffer, computing and caching it on a miss.
    pub fn filtered(
        &mut self,
        token: &str,
        source: &RgbaImage,
        filter: Filter,
        intensity: f64,
    ) -> Arc<RgbaImage> {
        let key = FilterKey::new(token, filter, intensity);
        if let Some(hit) = self.entries.get(&key) {
            return Arc::clone(hit);
        }
        let result = Arc::new(apply_filter(source, filter, intensity));
        self.entries.insert(key.clone(), Arc::clone(&result));
        result
    }

    /// Drop entries for sources other than the given token. Called when
    /// the background image changes.
    pub fn retain_token(&mut self, token: &str) {
        self.entries.retain(|key, _| key.token == token);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba(color))
    }

    #[test]
    fn test_filter_does_not_mutate_source() {
        let source = solid([100, 150, 200, 255]);
        let original = source.clone();
        let _ = apply_filter(&source, Filter::Invert, 0.0);
        assert_eq!(source, original);
    }

    #[test]
    fn test_filter_is_deterministic() {
        let source = solid([10, 200, 30, 255]);
        let a = apply_filter(&source, Filter::Contrast, 0.6);
        let b = apply_filter(&source, Filter::Contrast, 0.6);
        assert_eq!(a, b);
    }

    #[test]
    fn test_none_is_identity() {
        let source = solid([12, 34, 56, 255]);
        assert_eq!(apply_filter(&source, Filter::None, 0.9), source);
    }

    #[test]
    fn test_invert() {
        let out = apply_filter(&solid([0, 100, 255, 200]), Filter::Invert, 0.0);
        assert_eq!(out.get_pixel(0, 0).0, [255, 155, 0, 200]);
    }

    #[test]
    fn test_grayscale_weights() {
        let out = apply_filter(&solid([100, 100, 100, 255]), Filter::Grayscale, 0.0);
        assert_eq!(out.get_pixel(0, 0).0, [100, 100, 100, 255]);

        let out = apply_filter(&solid([255, 0, 0, 255]), Filter::Grayscale, 0.0);
        // 0.34 * 255 = 86.7
        assert_eq!(out.get_pixel(0, 0).0[0], 87);
        assert_eq!(out.get_pixel(0, 0).0[1], 87);
    }

    #[test]
    fn test_sepia_matrix() {
        let out = apply_filter(&solid([100, 100, 100, 255]), Filter::Sepia, 0.0);
        let [r, g, b, _] = out.get_pixel(0, 0).0;
        // Matrix rows sum to 1.351, 1.203, 0.937 for a gray input.
        assert_eq!(r, 135);
        assert_eq!(g, 120);
        assert_eq!(b, 94);
    }

    #[test]
    fn test_brighten_clamps() {
        let out = apply_filter(&solid([200, 200, 200, 255]), Filter::Brighten, 1.0);
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255, 255]);

        let out = apply_filter(&solid([100, 100, 100, 255]), Filter::Brighten, 0.2);
        assert_eq!(out.get_pixel(0, 0).0[0], 151);
    }

    #[test]
    fn test_contrast_pushes_away_from_midpoint() {
        let dark = apply_filter(&solid([60, 60, 60, 255]), Filter::Contrast, 0.8);
        assert!(dark.get_pixel(0, 0).0[0] < 60);
        let light = apply_filter(&solid([200, 200, 200, 255]), Filter::Contrast, 0.8);
        assert!(light.get_pixel(0, 0).0[0] > 200);
        // The midpoint is a fixed point.
        let mid = apply_filter(&solid([128, 128, 128, 255]), Filter::Contrast, 0.8);
        let v = mid.get_pixel(0, 0).0[0];
        assert!((v as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_blur_zero_intensity_is_identity() {
        let source = solid([50, 60, 70, 255]);
        assert_eq!(apply_filter(&source, Filter::Blur, 0.0), source);
    }

    #[test]
    fn test_blur_uniform_image_unchanged() {
        let source = solid([50, 60, 70, 255]);
        let out = apply_filter(&source, Filter::Blur, 0.5);
        assert_eq!(out, source);
    }

    #[test]
    fn test_blur_smooths_edge() {
        let mut source = RgbaImage::from_pixel(8, 1, Rgba([0, 0, 0, 255]));
        for x in 4..8 {
            source.put_pixel(x, 0, Rgba([255, 255, 255, 255]));
        }
        let out = apply_filter(&source, Filter::Blur, 0.1);
        let edge = out.get_pixel(4, 0).0[0];
        assert!(edge > 0 && edge < 255);
    }

    #[test]
    fn test_cache_hit_returns_same_buffer() {
        let mut cache = FilterCache::new();
        let source = solid([9, 9, 9, 255]);
        let a = cache.filtered("tok", &source, Filter::Sepia, 0.0);
        let b = cache.filtered("tok", &source, Filter::Sepia, 0.0);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_ignores_intensity_for_parameterless() {
        let mut cache = FilterCache::new();
        let source = solid([9, 9, 9, 255]);
        let a = cache.filtered("tok", &source, Filter::Grayscale, 0.2);
        let b = cache.filtered("tok", &source, Filter::Grayscale, 0.9);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_cache_distinguishes_intensity_for_parametric() {
        let mut cache = FilterCache::new();
        let source = solid([9, 9, 9, 255]);
        let _ = cache.filtered("tok", &source, Filter::Brighten, 0.2);
        let _ = cache.filtered("tok", &source, Filter::Brighten, 0.9);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_retain_token_evicts_stale_sources() {
        let mut cache = FilterCache::new();
        let source = solid([9, 9, 9, 255]);
        let _ = cache.filtered("old", &source, Filter::Sepia, 0.0);
        let _ = cache.filtered("new", &source, Filter::Sepia, 0.0);
        cache.retain_token("new");
        assert_eq!(cache.len(), 1);
    }
}
