//! Covercraft Render Library
//!
//! CPU rasterization for the cover editor: background filters, font
//! resolution, the edit surface with its selection overlay, and the
//! full-resolution PNG export path.

pub mod export;
pub mod filters;
pub mod fonts;
pub mod raster;
pub mod scene;

pub use export::{render_cover, ExportError, ExportQueue, ExportedCover};
pub use filters::{apply_filter, FilterCache, MAX_BLUR_RADIUS};
pub use fonts::FontStore;
pub use raster::{Overlay, RasterRenderer};
pub use scene::{cover_fit, BACKGROUND_COLOR, GUIDE_COLOR, SELECTION_COLOR};
