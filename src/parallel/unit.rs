//! A single unit of work: one source file in, one JPEG out

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::parallel::cancel::CancellationSignal;
use crate::processing::{basename, output_path, ImageInfo, ProcessingEngine, ScaleFactor};

/// Cancellation context handed to every unit of a cancellable run
#[derive(Debug, Clone)]
pub(crate) struct CancelScope {
    pub signal: CancellationSignal,
    pub sentinel: Arc<str>,
}

impl CancelScope {
    fn tripped(scope: Option<&Self>) -> bool {
        scope.map_or(false, |scope| scope.signal.is_tripped())
    }
}

/// How a unit ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Written(ImageInfo),
    Cancelled,
}

/// Work description for one source file, fixed at dispatch time
#[derive(Debug, Clone)]
pub struct ImageTask {
    source: PathBuf,
    output: PathBuf,
    scale: ScaleFactor,
}

impl ImageTask {
    pub fn new(source: PathBuf, dest: &Path, scale: ScaleFactor) -> Self {
        let output = output_path(&source, dest);
        Self { source, output, scale }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Basename without extension
    pub fn name(&self) -> String {
        basename(&self.source)
    }

    /// Decode, size, resample, encode and write.
    ///
    /// With a scope, the signal is polled before decoding and again before
    /// resampling. A unit whose basename is the sentinel trips the signal right
    /// after its second checkpoint and still writes its own output.
    pub(crate) async fn run(
        &self,
        engine: &ProcessingEngine,
        cancel: Option<&CancelScope>,
    ) -> Result<UnitOutcome> {
        let name = self.name();

        if CancelScope::tripped(cancel) {
            warn!("Skipping {} before decode: run cancelled", name);
            return Ok(UnitOutcome::Cancelled);
        }

        let (raster, original) = engine.load(&self.source).await?;
        info!("Start processing {}", name);

        let (width, height) = self.scale.target_dimensions(original.width, original.height);
        debug!("{}: {}x{} -> {}x{}", name, original.width, original.height, width, height);

        if CancelScope::tripped(cancel) {
            warn!("Skipping {} before resample: run cancelled", name);
            return Ok(UnitOutcome::Cancelled);
        }

        if let Some(scope) = cancel {
            if name == *scope.sentinel {
                info!("Cancel in processing filename {}", name);
                scope.signal.signal();
            }
        }

        let resized = engine.resample(raster, width, height, &self.source).await?;
        let written = engine.save(resized, &self.output).await?;
        info!("Processed {}", name);

        Ok(UnitOutcome::Written(written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn fixture(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(width, height, Rgb([90, 90, 90])).save(&path).unwrap();
        path
    }

    fn scope(sentinel: &str) -> CancelScope {
        CancelScope {
            signal: CancellationSignal::new(),
            sentinel: Arc::from(sentinel),
        }
    }

    #[test]
    fn test_task_naming() {
        let task = ImageTask::new(PathBuf::from("/in/sub/cat.png"), Path::new("/out"), ScaleFactor::new(1.0));
        assert_eq!(task.name(), "cat");
        assert_eq!(task.output(), Path::new("/out/cat.jpg"));
        assert_eq!(task.source(), Path::new("/in/sub/cat.png"));
    }

    #[tokio::test]
    async fn test_writes_scaled_output() {
        let dir = TempDir::new().unwrap();
        let source = fixture(dir.path(), "wide.png", 30, 11);
        let task = ImageTask::new(source, dir.path(), ScaleFactor::new(0.5));

        let outcome = task.run(&ProcessingEngine::new(), None).await.unwrap();

        match outcome {
            UnitOutcome::Written(info) => assert_eq!((info.width, info.height), (15, 5)),
            UnitOutcome::Cancelled => panic!("unit should not be cancelled"),
        }
        assert!(dir.path().join("wide.jpg").exists());
    }

    #[tokio::test]
    async fn test_tripped_signal_skips_unit() {
        let dir = TempDir::new().unwrap();
        let source = fixture(dir.path(), "skip.png", 4, 4);
        let task = ImageTask::new(source, dir.path(), ScaleFactor::new(2.0));

        let scope = scope("nothing");
        scope.signal.signal();

        let outcome = task.run(&ProcessingEngine::new(), Some(&scope)).await.unwrap();
        assert_eq!(outcome, UnitOutcome::Cancelled);
        assert!(!dir.path().join("skip.jpg").exists());
    }

    #[tokio::test]
    async fn test_sentinel_trips_signal_and_still_writes() {
        let dir = TempDir::new().unwrap();
        let source = fixture(dir.path(), "poison.png", 6, 6);
        let task = ImageTask::new(source, dir.path(), ScaleFactor::new(1.0));
        let scope = scope("poison");

        let outcome = task.run(&ProcessingEngine::new(), Some(&scope)).await.unwrap();

        assert!(scope.signal.is_tripped());
        assert!(matches!(outcome, UnitOutcome::Written(_)));
        assert!(dir.path().join("poison.jpg").exists());
    }

    #[tokio::test]
    async fn test_zero_scale_fails_without_output() {
        let dir = TempDir::new().unwrap();
        let source = fixture(dir.path(), "tiny.png", 3, 3);
        let task = ImageTask::new(source, dir.path(), ScaleFactor::new(0.1));

        let err = task.run(&ProcessingEngine::new(), None).await.unwrap_err();
        assert!(matches!(err, crate::error::ResizeError::InvalidDimensions { .. }));
        assert!(!dir.path().join("tiny.jpg").exists());
    }
}
