//! Recursive image discovery

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::processing::formats::{has_extension, INPUT_EXTENSIONS};

/// Finds source images under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    extensions: Vec<String>,
}

impl DirectoryScanner {
    /// Scanner for `.png`, `.jpg` and `.jpeg`, in that order
    pub fn new() -> Self {
        Self::with_extensions(INPUT_EXTENSIONS)
    }

    /// Scanner for a custom extension list (without leading dots)
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    /// Recursively list matching files under `root`.
    ///
    /// One full pass is made per extension and the passes are concatenated in
    /// extension order. Results are not de-duplicated. Order inside a pass is
    /// whatever the filesystem yields. A missing root gives an empty list.
    pub fn find(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for extension in &self.extensions {
            let before = files.len();
            files.extend(Self::scan_pass(root, extension));
            debug!("Found {} *.{} files under {:?}", files.len() - before, extension, root);
        }

        files
    }

    fn scan_pass(root: &Path, extension: &str) -> Vec<PathBuf> {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    if Self::is_missing_root(&e) {
                        debug!("Source root {:?} does not exist", root);
                    } else {
                        warn!("Skipping unreadable entry: {}", e);
                    }
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| has_extension(path, extension))
            .collect()
    }

    /// A missing root is the normal "no images" case; anything else is worth a warning
    fn is_missing_root(error: &walkdir::Error) -> bool {
        error.depth() == 0
            && error
                .io_error()
                .map_or(false, |e| e.kind() == io::ErrorKind::NotFound)
    }
}

impl Default for DirectoryScanner {
    fn default() -> Self {
        Self::new()
    }
}
