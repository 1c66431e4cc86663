//! Shared progress counters for a batch run
//!
//! The completed/failed counters are the only state workers touch
//! concurrently; everything else in a run is per-job.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Progress tracking for one batch run
#[derive(Debug)]
pub struct BatchProgress {
    completed: AtomicUsize,
    failed: AtomicUsize,
    total: usize,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            total,
        }
    }

    /// Returns the new completed count
    pub fn increment_completed(&self) -> usize {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the new failed count
    pub fn increment_failed(&self) -> usize {
        self.failed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn failed_count(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Completion fraction in [0, 1] for a given completed count
    pub fn fraction(&self, completed: usize) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (completed as f64 / self.total as f64).clamp(0.0, 1.0)
    }
}
