//! Font resolution: system discovery through fontdb, rasterization faces
//! through fontdue.

use covercraft_core::{FontFamily, FontWeight};
use fontdb::{Database, Query, Source};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Resolves `(family, weight)` pairs to rasterization faces.
///
/// Faces are loaded lazily and cached. A font that cannot be resolved is
/// reported once at `warn` and callers fall back to placeholder boxes, so
/// rendering stays deterministic on machines without the product fonts.
pub struct FontStore {
    database: Database,
    faces: HashMap<(FontFamily, FontWeight), Option<Arc<fontdue::Font>>>,
    warned: HashSet<(FontFamily, FontWeight)>,
}

impl FontStore {
    /// Build a store over the system font database.
    pub fn system() -> Self {
        let mut database = Database::new();
        database.load_system_fonts();
        log::debug!("font database loaded, {} faces", database.len());
        Self {
            database,
            faces: HashMap::new(),
            warned: HashSet::new(),
        }
    }

    /// A store with no fonts. Every lookup misses; used by tests to keep
    /// rendering independent of installed fonts.
    pub fn empty() -> Self {
        Self {
            database: Database::new(),
            faces: HashMap::new(),
            warned: HashSet::new(),
        }
    }

    /// Load font data directly, bypassing system discovery.
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.database.load_font_data(data);
        // Invalidate misses so new data can resolve them.
        self.faces.retain(|_, face| face.is_some());
    }

    /// Resolve a face, caching hits and misses.
    pub fn face(&mut self, family: FontFamily, weight: FontWeight) -> Option<Arc<fontdue::Font>> {
        if let Some(cached) = self.faces.get(&(family, weight)) {
            return cached.clone();
        }

        let resolved = self.resolve(family, weight);
        if resolved.is_none() && self.warned.insert((family, weight)) {
            log::warn!(
                "font {} ({}) not available, using placeholder",
                family.name(),
                weight.display_name()
            );
        }
        self.faces.insert((family, weight), resolved.clone());
        resolved
    }

    fn resolve(&self, family: FontFamily, weight: FontWeight) -> Option<Arc<fontdue::Font>> {
        let query_weight = match weight {
            FontWeight::Regular => fontdb::Weight::NORMAL,
            FontWeight::Bold => fontdb::Weight::BOLD,
        };
        let query = Query {
            families: &[
                fontdb::Family::Name(family.name()),
                fontdb::Family::SansSerif,
            ],
            weight: query_weight,
            ..Query::default()
        };
        let id = self.database.query(&query)?;
        let face = self.database.face(id)?;

        let data = match &face.source {
            Source::Binary(data) => data.as_ref().as_ref().to_vec(),
            Source::File(path) => std::fs::read(path).ok()?,
            Source::SharedFile(_, data) => data.as_ref().as_ref().to_vec(),
        };

        let settings = fontdue::FontSettings {
            collection_index: face.index,
            ..fontdue::FontSettings::default()
        };
        match fontdue::Font::from_bytes(data, settings) {
            Ok(font) => Some(Arc::new(font)),
            Err(e) => {
                log::warn!("failed to parse font {}: {}", family.name(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_always_misses() {
        let mut store = FontStore::empty();
        for &family in FontFamily::all() {
            assert!(store.face(family, FontWeight::Regular).is_none());
            assert!(store.face(family, FontWeight::Bold).is_none());
        }
    }

    #[test]
    fn test_miss_is_cached() {
        let mut store = FontStore::empty();
        let _ = store.face(FontFamily::Anton, FontWeight::Regular);
        assert!(store
            .faces
            .contains_key(&(FontFamily::Anton, FontWeight::Regular)));
    }
}
