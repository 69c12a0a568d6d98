//! Scale factor and target size computation

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::FilterType;

/// Uniform scale factor applied to both image dimensions.
///
/// The value is not validated here. A factor that floors a dimension to zero
/// is passed through and rejected by the codec when it resamples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    pub fn new(factor: f64) -> Self {
        Self(factor)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Target size for a source raster: `floor(dimension * factor)`.
    ///
    /// Negative and NaN products saturate to zero.
    pub fn target_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        (self.apply(width), self.apply(height))
    }

    fn apply(self, dimension: u32) -> u32 {
        (f64::from(dimension) * self.0).floor() as u32
    }
}

impl From<f64> for ScaleFactor {
    fn from(factor: f64) -> Self {
        Self(factor)
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

impl From<FilterType> for image::imageops::FilterType {
    fn from(filter: FilterType) -> Self {
        match filter {
            FilterType::Triangle => image::imageops::FilterType::Triangle,
            FilterType::CatmullRom => image::imageops::FilterType::CatmullRom,
            FilterType::Gaussian => image::imageops::FilterType::Gaussian,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}
