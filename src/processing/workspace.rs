//! Destination directory preparation

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Result, ResizeError};

/// Makes sure the destination directory exists and holds no files.
pub struct Workspace;

impl Workspace {
    /// Create `dest` (with parents) if missing, otherwise delete every file
    /// below it. Subdirectories are left in place, emptied of files.
    ///
    /// A `dest` that exists but is not a directory is a setup error and is
    /// left untouched.
    pub fn clean(dest: &Path) -> Result<()> {
        if dest.exists() && !dest.is_dir() {
            return Err(ResizeError::setup(
                dest.to_path_buf(),
                io::Error::new(io::ErrorKind::AlreadyExists, "destination exists and is not a directory"),
            ));
        }

        if !dest.exists() {
            fs::create_dir_all(dest)
                .map_err(|e| ResizeError::setup(dest.to_path_buf(), e))?;
            info!("Created output directory {:?}", dest);
            return Ok(());
        }

        let mut removed = 0usize;
        for entry in WalkDir::new(dest) {
            let entry = entry.map_err(|e| ResizeError::setup(dest.to_path_buf(), e.into()))?;
            if entry.file_type().is_dir() {
                continue;
            }

            fs::remove_file(entry.path())
                .map_err(|e| ResizeError::setup(entry.path().to_path_buf(), e))?;
            debug!("Removed {:?}", entry.path());
            removed += 1;
        }

        info!("Cleaned output directory {:?} ({} files removed)", dest, removed);
        Ok(())
    }
}
