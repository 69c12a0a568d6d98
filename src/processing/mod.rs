//! Core image processing functionality

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

use crate::error::{Result, ResizeError};

pub mod codec;
pub mod discovery;
pub mod formats;
pub mod resize;
pub mod workspace;

pub use codec::*;
pub use discovery::*;
pub use formats::*;
pub use resize::*;
pub use workspace::*;

/// Runs the individual phases of a resize against a codec.
///
/// File I/O goes through `tokio::fs`; codec work runs on the blocking pool.
#[derive(Clone)]
pub struct ProcessingEngine {
    codec: Arc<dyn ImageCodec>,
}

impl ProcessingEngine {
    /// Engine backed by the default JPEG codec
    pub fn new() -> Self {
        Self::with_codec(Arc::new(JpegCodec::new()))
    }

    /// Engine backed by a custom codec
    pub fn with_codec(codec: Arc<dyn ImageCodec>) -> Self {
        Self { codec }
    }

    /// Read and decode a source image
    pub async fn load(&self, path: &Path) -> Result<(Raster, ImageInfo)> {
        debug!("Loading image: {:?}", path);

        let data = fs::read(path).await
            .map_err(|source| ResizeError::Read { file: path.to_path_buf(), source })?;
        let file_size = data.len() as u64;

        let raster = tokio::task::spawn_blocking({
            let codec = Arc::clone(&self.codec);
            move || codec.decode(&data)
        }).await
        .map_err(|e| ResizeError::parallel(format!("Task join error: {}", e)))?
        .map_err(|e| e.with_file(path.to_path_buf()))?;

        let info = ImageInfo {
            path: path.to_path_buf(),
            width: raster.width(),
            height: raster.height(),
            file_size,
        };

        debug!("Loaded image: {}x{} ({} bytes)", info.width, info.height, info.file_size);

        Ok((raster, info))
    }

    /// Resample a raster to the given size
    pub async fn resample(
        &self,
        raster: Raster,
        width: u32,
        height: u32,
        source: &Path,
    ) -> Result<Raster> {
        tokio::task::spawn_blocking({
            let codec = Arc::clone(&self.codec);
            move || codec.resample(&raster, width, height)
        }).await
        .map_err(|e| ResizeError::parallel(format!("Task join error: {}", e)))?
        .map_err(|e| e.with_file(source.to_path_buf()))
    }

    /// Encode a raster as JPEG and write it, replacing any existing file
    pub async fn save(&self, raster: Raster, output_path: &Path) -> Result<ImageInfo> {
        debug!("Saving image: {:?}", output_path);

        let (width, height) = (raster.width(), raster.height());
        let bytes = tokio::task::spawn_blocking({
            let codec = Arc::clone(&self.codec);
            move || codec.encode(&raster)
        }).await
        .map_err(|e| ResizeError::parallel(format!("Task join error: {}", e)))?
        .map_err(|e| e.with_file(output_path.to_path_buf()))?;

        fs::write(output_path, &bytes).await
            .map_err(|source| ResizeError::Write { file: output_path.to_path_buf(), source })?;

        Ok(ImageInfo {
            path: output_path.to_path_buf(),
            width,
            height,
            file_size: bytes.len() as u64,
        })
    }
}

impl Default for ProcessingEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about an image file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
}
