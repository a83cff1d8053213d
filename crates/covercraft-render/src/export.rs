//! PNG export of the cover at full output resolution.

use crate::raster::RasterRenderer;
use base64::Engine;
use covercraft_core::Document;
use thiserror::Error;

/// Errors raised while producing the export PNG.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PNG encoding failed: {0}")]
    Encoding(String),
    #[error("Export dimensions are zero")]
    EmptySurface,
}

/// A finished export: encoded PNG bytes plus pixel dimensions.
#[derive(Debug, Clone)]
pub struct ExportedCover {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ExportedCover {
    /// The upload payload shape: a `data:image/png;base64,` URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

/// Render the document at `canvas_size * export_scale` and encode it as
/// an RGBA PNG. The caller passes a snapshot captured at invocation; later
/// edits to the live document do not affect the output.
pub fn render_cover(
    renderer: &mut RasterRenderer,
    doc: &Document,
) -> Result<ExportedCover, ExportError> {
    let surface = renderer.render_scaled(doc, doc.export_scale, None);
    let (width, height) = surface.dimensions();
    if width == 0 || height == 0 {
        return Err(ExportError::EmptySurface);
    }

    let mut png = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| ExportError::Encoding(e.to_string()))?;
        writer
            .write_image_data(surface.as_raw())
            .map_err(|e| ExportError::Encoding(e.to_string()))?;
    }

    log::info!("exported cover at {}x{}", width, height);
    Ok(ExportedCover { png, width, height })
}

/// Serializes exports at depth 1.
///
/// At most one export runs at a time. A request arriving while one is in
/// flight is queued; a further request replaces the queued snapshot, so
/// finishing an export starts at most one more.
#[derive(Debug, Default)]
pub struct ExportQueue {
    in_flight: bool,
    queued: Option<Document>,
}

impl ExportQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a snapshot. Returns it back if the queue was idle (the
    /// caller starts rendering); otherwise stores it for later, replacing
    /// any previously queued snapshot.
    pub fn begin(&mut self, snapshot: Document) -> Option<Document> {
        if self.in_flight {
            log::debug!("export in flight, queueing request");
            self.queued = Some(snapshot);
            None
        } else {
            self.in_flight = true;
            Some(snapshot)
        }
    }

    /// Mark the running export finished. Returns the queued snapshot to
    /// render next, if any; the queue stays in flight in that case.
    pub fn complete(&mut self) -> Option<Document> {
        match self.queued.take() {
            Some(next) => Some(next),
            None => {
                self.in_flight = false;
                None
            }
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn has_queued(&self) -> bool {
        self.queued.is_some()
    }
}
