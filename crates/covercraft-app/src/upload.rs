//! Delivery of finished covers to a destination.

use covercraft_core::storage::BoxFuture;
use covercraft_render::ExportedCover;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors raised while handing a finished cover off.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

/// Destination for exported covers. Implementations return a locator for
/// the delivered cover (a file path, a URL).
pub trait CoverSink: Send + Sync {
    fn deliver<'a>(
        &'a self,
        cover: &'a ExportedCover,
    ) -> BoxFuture<'a, Result<String, DeliveryError>>;
}

/// Writes covers as PNG files into a directory.
pub struct FileSink {
    directory: PathBuf,
}

impl FileSink {
    pub fn new(directory: PathBuf) -> Result<Self, DeliveryError> {
        std::fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    fn next_path(&self) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        self.directory.join(format!("cover-{}.png", stamp))
    }
}

impl CoverSink for FileSink {
    fn deliver<'a>(
        &'a self,
        cover: &'a ExportedCover,
    ) -> BoxFuture<'a, Result<String, DeliveryError>> {
        Box::pin(async move {
            let path = self.next_path();
            std::fs::write(&path, &cover.png)?;
            log::info!(
                "wrote {}x{} cover to {}",
                cover.width,
                cover.height,
                path.display()
            );
            Ok(path.display().to_string())
        })
    }
}

/// Keeps the cover in memory and returns it as a data URL. Stands in for
/// a network backend.
#[derive(Debug, Default)]
pub struct NullSink;

impl CoverSink for NullSink {
    fn deliver<'a>(
        &'a self,
        cover: &'a ExportedCover,
    ) -> BoxFuture<'a, Result<String, DeliveryError>> {
        Box::pin(async move { Ok(cover.to_data_url()) })
    }
}
