//! Concurrent fan-out of resize units over a source tree

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::{Result, ResizeError};
use crate::processing::{DirectoryScanner, ImageCodec, ProcessingEngine, ScaleFactor};

pub mod cancel;
pub mod progress;
pub mod unit;

pub use cancel::*;
pub use progress::*;
pub use unit::{ImageTask, UnitOutcome};

use unit::CancelScope;

/// Discovers the images of a source tree and resizes them, one task per file.
pub struct ResizeOrchestrator {
    engine: ProcessingEngine,
    scanner: DirectoryScanner,
    max_concurrent: Option<usize>,
    sentinel: Arc<str>,
    progress_tracker: Arc<ProgressTracker>,
}

impl ResizeOrchestrator {
    /// Orchestrator with the JPEG codec, no concurrency cap and the default sentinel
    pub fn new() -> Self {
        Self {
            engine: ProcessingEngine::new(),
            scanner: DirectoryScanner::new(),
            max_concurrent: None,
            sentinel: Arc::from(DEFAULT_SENTINEL),
            progress_tracker: Arc::new(ProgressTracker::new()),
        }
    }

    /// Use a different codec
    pub fn with_codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.engine = ProcessingEngine::with_codec(codec);
        self
    }

    /// Cap the number of units running at once. `None` lets every unit start immediately.
    pub fn with_max_concurrent(mut self, max_concurrent: Option<usize>) -> Self {
        self.max_concurrent = max_concurrent.map(|n| n.max(1));
        self
    }

    /// Basename that trips the signal in cancellable runs
    pub fn with_sentinel<S: Into<String>>(mut self, sentinel: S) -> Self {
        let sentinel: String = sentinel.into();
        self.sentinel = Arc::from(sentinel);
        self
    }

    /// Report progress to `tracker`, typically one the caller already subscribed to
    pub fn with_progress(mut self, tracker: Arc<ProgressTracker>) -> Self {
        self.progress_tracker = tracker;
        self
    }

    /// Progress tracker that runs report to.
    ///
    /// The tracker follows one run at a time. A run started while another
    /// holds it reports to a private tracker instead.
    pub fn progress(&self) -> Arc<ProgressTracker> {
        Arc::clone(&self.progress_tracker)
    }

    /// Resize every image under `src` into `dest`.
    ///
    /// Returns `Completed` or the first unit error in dispatch order. Failing
    /// units do not stop the others; the call returns once all have finished.
    pub async fn resize_all(
        &self,
        src: &Path,
        dest: &Path,
        scale: ScaleFactor,
    ) -> Result<RunResult> {
        self.run(src, dest, scale, None).await
    }

    /// Like [`resize_all`](Self::resize_all), with cooperative cancellation.
    ///
    /// Units poll `signal` before decoding and before resampling. If the signal
    /// is tripped by the time every unit has drained, the run is `Cancelled`
    /// and unit errors are not surfaced.
    pub async fn resize_all_cancellable(
        &self,
        src: &Path,
        dest: &Path,
        scale: ScaleFactor,
        signal: &CancellationSignal,
    ) -> Result<RunResult> {
        let scope = CancelScope {
            signal: signal.clone(),
            sentinel: Arc::clone(&self.sentinel),
        };
        self.run(src, dest, scale, Some(scope)).await
    }

    async fn run(
        &self,
        src: &Path,
        dest: &Path,
        scale: ScaleFactor,
        cancel: Option<CancelScope>,
    ) -> Result<RunResult> {
        let start_time = Instant::now();
        let files = self.scanner.find(src);
        let discovered = files.len();

        info!("Found {} images under {:?}, scaling by {}", discovered, src, scale);
        let progress_tracker = self.claim_progress(discovered);

        let semaphore = self.max_concurrent.map(|n| Arc::new(Semaphore::new(n)));
        let cancel = cancel.map(Arc::new);

        let mut tasks = Vec::with_capacity(discovered);
        for source in files {
            let task = ImageTask::new(source, dest, scale);
            let engine = self.engine.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            let progress_tracker = Arc::clone(&progress_tracker);

            tasks.push(tokio::spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => match semaphore.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(e) => {
                            return Err(ResizeError::parallel(format!("Failed to acquire semaphore: {}", e)));
                        }
                    },
                    None => None,
                };

                let name = task.name();
                progress_tracker.start_unit(&name);

                let result = task.run(&engine, cancel.as_deref()).await;

                let status = match &result {
                    Ok(UnitOutcome::Written(_)) => UnitStatus::Written,
                    Ok(UnitOutcome::Cancelled) => UnitStatus::Cancelled,
                    Err(e) => {
                        debug!("Failed to process {:?}: {}", task.source(), e);
                        UnitStatus::Failed(e.to_string())
                    }
                };
                progress_tracker.finish_unit(&name, status);

                result
            }));
        }

        // Drain every unit, cancelled or not
        let results: Vec<Result<UnitOutcome>> = futures::future::join_all(tasks).await
            .into_iter()
            .map(|task_result| {
                task_result
                    .map_err(|e| ResizeError::parallel(format!("Task join error: {}", e)))
                    .and_then(|result| result)
            })
            .collect();

        let progress = progress_tracker.finish_run();
        debug!("Progress at end of run: {} in {:?}", progress.status_text(), progress.elapsed);

        let summary = RunSummary::from_results(discovered, &results, start_time);
        let cancelled = cancel.map_or(false, |scope| scope.signal.is_tripped());

        Self::aggregate(results, summary, cancelled)
    }

    /// Claim the configured tracker, or a private one if another run holds it
    fn claim_progress(&self, total_files: usize) -> Arc<ProgressTracker> {
        if self.progress_tracker.try_start(total_files) {
            return Arc::clone(&self.progress_tracker);
        }

        debug!("Progress tracker busy with another run, reporting to a private tracker");
        let tracker = Arc::new(ProgressTracker::new());
        tracker.try_start(total_files);
        tracker
    }

    fn aggregate(
        results: Vec<Result<UnitOutcome>>,
        summary: RunSummary,
        cancelled: bool,
    ) -> Result<RunResult> {
        if cancelled {
            warn!(
                "Run cancelled: {} written, {} skipped, {} failed",
                summary.written, summary.cancelled, summary.failed
            );
            return Ok(RunResult::Cancelled(summary));
        }

        if let Some(error) = results.into_iter().find_map(|result| result.err()) {
            warn!("Run failed after {} of {} units: {}", summary.written, summary.discovered, error);
            return Err(error);
        }

        info!("Run completed: {} images written in {}ms", summary.written, summary.elapsed_ms);
        Ok(RunResult::Completed(summary))
    }
}

impl Default for ResizeOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub discovered: usize,
    pub written: usize,
    pub cancelled: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

impl RunSummary {
    fn from_results(
        discovered: usize,
        results: &[Result<UnitOutcome>],
        start_time: Instant,
    ) -> Self {
        let mut summary = Self {
            discovered,
            elapsed_ms: u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX),
            ..Self::default()
        };

        for result in results {
            match result {
                Ok(UnitOutcome::Written(_)) => summary.written += 1,
                Ok(UnitOutcome::Cancelled) => summary.cancelled += 1,
                Err(_) => summary.failed += 1,
            }
        }

        summary
    }
}

/// Outcome of a run that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "summary", rename_all = "lowercase")]
pub enum RunResult {
    /// Every unit wrote its output
    Completed(RunSummary),
    /// The cancellation signal was tripped during the run
    Cancelled(RunSummary),
}

impl RunResult {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    pub fn summary(&self) -> &RunSummary {
        match self {
            Self::Completed(summary) | Self::Cancelled(summary) => summary,
        }
    }
}
