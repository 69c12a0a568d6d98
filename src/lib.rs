//! ImageResizer - concurrent batch image scaling
//!
//! Scales every PNG/JPEG under a source tree by a fixed factor and writes
//! the results as JPEG files into a flat destination directory. Each image
//! is resized by its own task; runs can be stopped cooperatively through a
//! shared cancellation signal.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use image_resizer::{ResizeOrchestrator, ScaleFactor, Workspace};
//! use std::path::Path;
//!
//! # async fn run() -> image_resizer::Result<()> {
//! let dest = Path::new("output");
//! Workspace::clean(dest)?;
//!
//! let outcome = ResizeOrchestrator::new()
//!     .resize_all(Path::new("images"), dest, ScaleFactor::new(0.5))
//!     .await?;
//!
//! println!("{} images written", outcome.summary().written);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod processing;
pub mod parallel;

// Re-export commonly used types
pub use config::{Config, FilterType};
pub use error::{ErrorKind, Result, ResizeError};
pub use processing::{DirectoryScanner, ImageCodec, JpegCodec, Raster, ScaleFactor, Workspace};
pub use parallel::{CancellationSignal, ResizeOrchestrator, RunResult, RunSummary};

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging from `RUST_LOG` and report system capabilities.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    install_subscriber(filter, false);
    validate_system_requirements();
    Ok(())
}

/// Initialize with custom configuration
pub fn init_with_config(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.logging.level)
        .map_err(|e| ResizeError::config(format!("Invalid log level '{}': {}", config.logging.level, e)))?;
    install_subscriber(filter, config.logging.json_format);
    validate_system_requirements();
    Ok(())
}

fn install_subscriber(filter: EnvFilter, json_format: bool) {
    let installed = if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_thread_ids(true).with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!("ImageResizer v{} initialized", VERSION);
    }
}

fn validate_system_requirements() {
    use sysinfo::{System, SystemExt};

    let mut system = System::new();
    system.refresh_memory();

    const MIN_MEMORY_MB: u64 = 256;
    let available_memory = system.available_memory();
    if available_memory < MIN_MEMORY_MB * 1024 * 1024 {
        warn!(
            "Low available memory: {}MB (recommended: >{}MB)",
            available_memory / (1024 * 1024),
            MIN_MEMORY_MB
        );
    }

    info!("Detected {} logical CPUs", num_cpus::get());
}
