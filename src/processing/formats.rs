//! Scanned input extensions and output naming

use std::path::{Path, PathBuf};

/// Extensions picked up by the scanner, in scan order. Matching is case-sensitive.
pub const INPUT_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Extension of every output file
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Check whether a path carries exactly the given extension
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext == extension)
}

/// Basename of a source file without its extension
pub fn basename(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Flat output location: `dest/<basename>.jpg`.
///
/// Sources with the same basename in different folders or with different
/// extensions map to the same output; the last writer wins.
pub fn output_path(source: &Path, dest: &Path) -> PathBuf {
    dest.join(format!("{}.{}", basename(source), OUTPUT_EXTENSION))
}
