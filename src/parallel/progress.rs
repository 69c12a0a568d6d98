//! Progress tracking for a resize run

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Terminal state of one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    Written,
    Cancelled,
    Failed(String),
}

/// Progress update event
#[derive(Debug, Clone)]
pub enum ProgressUpdate {
    Started {
        total_files: usize,
    },
    UnitStarted {
        filename: String,
    },
    UnitFinished {
        filename: String,
        status: UnitStatus,
    },
    RunFinished {
        snapshot: ProgressSnapshot,
    },
}

/// Point-in-time counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSnapshot {
    pub total_files: usize,
    pub written: usize,
    pub cancelled: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Units that reached a terminal state
    pub fn finished(&self) -> usize {
        self.written + self.cancelled + self.failed
    }

    /// Human-readable completion status
    pub fn status_text(&self) -> String {
        format!("{}/{} files finished", self.finished(), self.total_files)
    }
}

/// Thread-safe progress tracker shared by all units of a run.
///
/// A tracker follows one run at a time: [`try_start`](Self::try_start) claims
/// it and [`finish_run`](Self::finish_run) releases it.
pub struct ProgressTracker {
    sender: broadcast::Sender<ProgressUpdate>,
    active: AtomicBool,
    start_time: Mutex<Option<Instant>>,
    total: AtomicUsize,
    written: AtomicUsize,
    cancelled: AtomicUsize,
    failed: AtomicUsize,
}

impl ProgressTracker {
    /// Create a new progress tracker
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1000);

        Self {
            sender,
            active: AtomicBool::new(false),
            start_time: Mutex::new(None),
            total: AtomicUsize::new(0),
            written: AtomicUsize::new(0),
            cancelled: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    /// Claim the tracker for a run over `total_files` inputs and reset its
    /// counters. Returns `false`, changing nothing, while another run holds it.
    pub fn try_start(&self, total_files: usize) -> bool {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        if let Ok(mut start_time) = self.start_time.lock() {
            *start_time = Some(Instant::now());
        }

        self.total.store(total_files, Ordering::Relaxed);
        self.written.store(0, Ordering::Relaxed);
        self.cancelled.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);

        let _ = self.sender.send(ProgressUpdate::Started { total_files });

        info!("Started progress tracking for {} files", total_files);
        true
    }

    /// Whether a run currently holds the tracker
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Mark a unit as started
    pub fn start_unit(&self, filename: &str) {
        let _ = self.sender.send(ProgressUpdate::UnitStarted {
            filename: filename.to_string(),
        });
    }

    /// Mark a unit as finished
    pub fn finish_unit(&self, filename: &str, status: UnitStatus) {
        let counter = match status {
            UnitStatus::Written => &self.written,
            UnitStatus::Cancelled => &self.cancelled,
            UnitStatus::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        debug!("Finished unit {} ({:?})", filename, status);

        let _ = self.sender.send(ProgressUpdate::UnitFinished {
            filename: filename.to_string(),
            status,
        });
    }

    /// Mark the run as finished, release the tracker and return the final counters
    pub fn finish_run(&self) -> ProgressSnapshot {
        let snapshot = self.snapshot();
        let _ = self.sender.send(ProgressUpdate::RunFinished {
            snapshot: snapshot.clone(),
        });
        self.active.store(false, Ordering::Release);
        snapshot
    }

    /// Current counters
    pub fn snapshot(&self) -> ProgressSnapshot {
        let elapsed = self
            .start_time
            .lock()
            .ok()
            .and_then(|start| start.as_ref().map(Instant::elapsed))
            .unwrap_or_default();

        ProgressSnapshot {
            total_files: self.total.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            elapsed,
        }
    }

    /// Subscribe to progress updates
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressUpdate> {
        self.sender.subscribe()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
