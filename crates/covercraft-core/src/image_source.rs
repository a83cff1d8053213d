//! Decoded background image sources and the content-addressed cache.

use image::RgbaImage;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised when a background image cannot be decoded.
#[derive(Debug, Error)]
pub enum ImageDecodeError {
    #[error("Unsupported or corrupt image data: {0}")]
    Decode(String),
    #[error("Image has zero width or height")]
    EmptyImage,
}

/// A decoded raster image identified by the blake3 hash of its encoded bytes.
///
/// The token is what the persisted snapshot stores; pixel data never leaves
/// the process.
#[derive(Debug)]
pub struct ImageSource {
    token: String,
    pixels: RgbaImage,
}

impl ImageSource {
    /// Decode encoded image bytes (PNG, JPEG, etc.) into a source.
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageDecodeError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| ImageDecodeError::Decode(e.to_string()))?;
        let pixels = decoded.to_rgba8();
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(ImageDecodeError::EmptyImage);
        }
        let token = blake3::hash(bytes).to_hex().to_string();
        Ok(Self { token, pixels })
    }

    /// Build a source from raw pixels. The token hashes the pixel buffer.
    pub fn from_pixels(pixels: RgbaImage) -> Result<Self, ImageDecodeError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(ImageDecodeError::EmptyImage);
        }
        let token = blake3::hash(pixels.as_raw()).to_hex().to_string();
        Ok(Self { token, pixels })
    }

    /// Content hash of the encoded source bytes.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Session-scoped cache of decoded sources, keyed by content token.
///
/// Snapshot restoration resolves `imageRefToken` values here; a miss means
/// the document comes back without its background image.
#[derive(Debug, Default)]
pub struct ImageCache {
    sources: HashMap<String, Arc<ImageSource>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a source, returning the shared handle.
    pub fn insert(&mut self, source: ImageSource) -> Arc<ImageSource> {
        let handle = Arc::new(source);
        self.sources
            .insert(handle.token().to_string(), Arc::clone(&handle));
        handle
    }

    pub fn get(&self, token: &str) -> Option<Arc<ImageSource>> {
        self.sources.get(token).cloned()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.sources.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
