//! Error types and handling for ImageResizer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ImageResizer operations
pub type Result<T> = std::result::Result<T, ResizeError>;

/// Main error type for ImageResizer operations
#[derive(Debug, Error)]
pub enum ResizeError {
    /// Destination directory could not be created or emptied
    #[error("Failed to prepare destination {path:?}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source file could not be read
    #[error("Failed to read {file:?}: {source}")]
    Read {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source file is not a decodable image
    #[error("Failed to decode image: {message} (file: {file:?})")]
    Decode {
        message: String,
        file: Option<PathBuf>,
    },

    /// Target dimensions the codec cannot produce
    #[error("Invalid target dimensions: {width}x{height} (file: {file:?})")]
    InvalidDimensions {
        width: u32,
        height: u32,
        file: Option<PathBuf>,
    },

    /// Raster could not be encoded
    #[error("Failed to encode image: {message} (file: {file:?})")]
    Encode {
        message: String,
        file: Option<PathBuf>,
    },

    /// Encoded output could not be written
    #[error("Failed to write {file:?}: {source}")]
    Write {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serde(String),

    /// A unit of work panicked or could not be joined
    #[error("Parallel processing error: {message}")]
    Parallel { message: String },
}

/// Coarse classification used at the aggregation boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Setup,
    Decode,
    EncodeOrWrite,
    Config,
    Internal,
}

impl ResizeError {
    /// Create a new setup error
    pub fn setup(path: PathBuf, source: std::io::Error) -> Self {
        Self::Setup { path, source }
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(message: S, file: Option<PathBuf>) -> Self {
        Self::Decode {
            message: message.into(),
            file,
        }
    }

    /// Create a new invalid dimensions error
    pub fn invalid_dimensions(width: u32, height: u32, file: Option<PathBuf>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            file,
        }
    }

    /// Create a new encode error
    pub fn encode<S: Into<String>>(message: S, file: Option<PathBuf>) -> Self {
        Self::Encode {
            message: message.into(),
            file,
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new parallel processing error
    pub fn parallel<S: Into<String>>(message: S) -> Self {
        Self::Parallel {
            message: message.into(),
        }
    }

    /// Which part of the taxonomy this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Setup { .. } => ErrorKind::Setup,
            Self::Read { .. } | Self::Decode { .. } => ErrorKind::Decode,
            Self::InvalidDimensions { .. } | Self::Encode { .. } | Self::Write { .. } => {
                ErrorKind::EncodeOrWrite
            }
            Self::Config { .. } | Self::Serde(_) => ErrorKind::Config,
            Self::Parallel { .. } => ErrorKind::Internal,
        }
    }

    /// Get the associated file path if available
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Decode { file, .. }
            | Self::InvalidDimensions { file, .. }
            | Self::Encode { file, .. } => file.as_ref(),

            Self::Setup { path, .. } => Some(path),
            Self::Read { file, .. } | Self::Write { file, .. } => Some(file),

            _ => None,
        }
    }

    /// Attach a file to errors raised by the codec, which only sees bytes
    pub fn with_file(mut self, path: PathBuf) -> Self {
        match &mut self {
            Self::Decode { file, .. }
            | Self::InvalidDimensions { file, .. }
            | Self::Encode { file, .. } => {
                if file.is_none() {
                    *file = Some(path);
                }
            }
            _ => {}
        }
        self
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Setup { path, source } => {
                format!("Could not prepare output directory {}: {}", path.display(), source)
            }
            Self::Decode { .. } => {
                format!("{}. Supported inputs: PNG, JPEG", self)
            }
            Self::InvalidDimensions { width, height, .. } => {
                format!(
                    "Scaled size {}x{} is empty. Use a larger scale factor.",
                    width, height
                )
            }
            Self::Write { file, source } => {
                format!("Could not write {}: {}", file.display(), source)
            }
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for ResizeError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serde(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_yaml::Error> for ResizeError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serde(format!("YAML parsing error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_kinds() {
        let io = || std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");

        assert_eq!(ResizeError::setup(PathBuf::from("out"), io()).kind(), ErrorKind::Setup);
        assert_eq!(ResizeError::decode("bad", None).kind(), ErrorKind::Decode);
        assert_eq!(
            ResizeError::Write { file: PathBuf::from("a.jpg"), source: io() }.kind(),
            ErrorKind::EncodeOrWrite
        );
        assert_eq!(ResizeError::invalid_dimensions(0, 0, None).kind(), ErrorKind::EncodeOrWrite);
        assert_eq!(ResizeError::parallel("boom").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_with_file_fills_missing_path() {
        let err = ResizeError::decode("truncated", None).with_file(PathBuf::from("a.png"));
        assert_eq!(err.file_path().map(|p| p.as_path()), Some(Path::new("a.png")));

        // An existing path is kept
        let err = ResizeError::encode("x", Some(PathBuf::from("first.png")))
            .with_file(PathBuf::from("second.png"));
        assert_eq!(err.file_path().map(|p| p.as_path()), Some(Path::new("first.png")));
    }

    #[test]
    fn test_user_messages() {
        let msg = ResizeError::invalid_dimensions(0, 3, None).user_message();
        assert!(msg.contains("0x3"));

        let msg = ResizeError::decode("not an image", None).user_message();
        assert!(msg.contains("PNG, JPEG"));
    }
}
