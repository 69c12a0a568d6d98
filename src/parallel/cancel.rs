//! Cooperative cancellation shared by the units of one run

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Basename that trips the signal when no other sentinel is configured
pub const DEFAULT_SENTINEL: &str = "6CxiNWJceow";

/// Shared stop flag polled by units at their checkpoints.
///
/// Clones observe the same flag. Tripping it never interrupts a unit; it
/// only makes later checkpoints bail out.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    tripped: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent; safe to call from any unit.
    pub fn signal(&self) {
        self.tripped.store(true, Ordering::Release);
    }

    /// Non-blocking read of the flag
    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }
}
