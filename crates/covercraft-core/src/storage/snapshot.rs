//! The persisted document snapshot schema.

use crate::document::{
    BackgroundLayer, Color, Document, Filter, FontFamily, FontWeight, LayerId, TextLayer,
};
use crate::image_source::ImageCache;
use serde::{Deserialize, Serialize};

/// Persisted form of a text layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTextLayer {
    pub id: LayerId,
    pub text: String,
    pub font_family: FontFamily,
    pub font_size: f64,
    pub color: Color,
    pub font_weight: FontWeight,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

/// Persisted form of the background layer. The decoded bitmap is never
/// stored; only the content token of the source bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedBackground {
    pub image_ref_token: Option<String>,
    pub filter: Filter,
    pub filter_intensity: f64,
}

/// The JSON document snapshot written by the autosave path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub canvas_size: f64,
    pub export_scale: f64,
    pub background: PersistedBackground,
    pub text_layers: Vec<PersistedTextLayer>,
}

impl PersistedSnapshot {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            canvas_size: doc.canvas_size,
            export_scale: doc.export_scale,
            background: PersistedBackground {
                image_ref_token: doc
                    .background
                    .image
                    .as_deref()
                    .map(|source| source.token().to_string()),
                filter: doc.background.filter,
                filter_intensity: doc.background.filter_intensity,
            },
            text_layers: doc
                .text_layers
                .iter()
                .map(|layer| PersistedTextLayer {
                    id: layer.id,
                    text: layer.text.clone(),
                    font_family: layer.font_family,
                    font_size: layer.font_size,
                    color: layer.color,
                    font_weight: layer.font_weight,
                    x: layer.x,
                    y: layer.y,
                    rotation: layer.rotation,
                    scale_x: layer.scale_x,
                    scale_y: layer.scale_y,
                })
                .collect(),
        }
    }

    /// Rebuild a document, resolving image tokens through the cache. An
    /// unresolvable token restores the document without its background
    /// image; the filter settings are kept.
    pub fn into_document(self, images: &ImageCache) -> Document {
        let image = self
            .background
            .image_ref_token
            .as_deref()
            .and_then(|token| {
                let resolved = images.get(token);
                if resolved.is_none() {
                    log::warn!("background image token not in cache, restoring without image");
                }
                resolved
            });

        Document {
            canvas_size: self.canvas_size,
            export_scale: self.export_scale,
            background: BackgroundLayer {
                image,
                filter: self.background.filter,
                filter_intensity: self.background.filter_intensity,
            },
            text_layers: self
                .text_layers
                .into_iter()
                .map(|layer| TextLayer {
                    id: layer.id,
                    text: layer.text,
                    font_family: layer.font_family,
                    font_size: layer.font_size,
                    color: layer.color,
                    font_weight: layer.font_weight,
                    x: layer.x,
                    y: layer.y,
                    rotation: layer.rotation,
                    scale_x: layer.scale_x,
                    scale_y: layer.scale_y,
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
