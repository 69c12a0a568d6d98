//! Image decode, resample and JPEG encode

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;

use crate::config::FilterType;
use crate::error::{Result, ResizeError};

/// Decoded in-memory pixel grid
pub type Raster = DynamicImage;

/// Codec capability used by every unit of work.
///
/// Implementations only see bytes and rasters; callers attach file context
/// to the errors they return.
pub trait ImageCodec: Send + Sync {
    /// Decode an encoded image into a raster
    fn decode(&self, bytes: &[u8]) -> Result<Raster>;

    /// Resample a raster to exactly `width` x `height`
    fn resample(&self, raster: &Raster, width: u32, height: u32) -> Result<Raster>;

    /// Encode a raster as JPEG
    fn encode(&self, raster: &Raster) -> Result<Vec<u8>>;
}

/// `image`-crate codec writing JPEG output
#[derive(Debug, Clone)]
pub struct JpegCodec {
    filter: FilterType,
    quality: u8,
}

impl JpegCodec {
    /// Create a codec with Lanczos3 filtering and quality 90
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
            quality: 90,
        }
    }

    /// Use a different resampling filter
    pub fn filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Set JPEG quality, clamped to 1-100
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCodec for JpegCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Raster> {
        image::load_from_memory(bytes)
            .map_err(|e| ResizeError::decode(e.to_string(), None))
    }

    fn resample(&self, raster: &Raster, width: u32, height: u32) -> Result<Raster> {
        if width == 0 || height == 0 {
            return Err(ResizeError::invalid_dimensions(width, height, None));
        }

        debug!(
            "Resampling {}x{} -> {}x{} using {:?}",
            raster.width(),
            raster.height(),
            width,
            height,
            self.filter
        );

        Ok(raster.resize_exact(width, height, self.filter.into()))
    }

    fn encode(&self, raster: &Raster) -> Result<Vec<u8>> {
        // JPEG has no alpha channel
        let flattened = DynamicImage::ImageRgb8(raster.to_rgb8());

        let mut output = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut output, self.quality);
        flattened
            .write_with_encoder(encoder)
            .map_err(|e| ResizeError::encode(e.to_string(), None))?;

        Ok(output)
    }
}
