use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::dispatch::result::JobResult;

/// Shared completion counter for a dispatch. The total is fixed up front.
#[derive(Clone, Debug)]
pub struct DispatchProgress {
    completed: Arc<AtomicUsize>,
    total: usize,
}

impl DispatchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total,
        }
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Record one more terminal job and return the new completed count.
    pub(crate) fn advance(&self) -> usize {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Receives a callback each time a job reaches a terminal status.
///
/// Called concurrently from worker threads, in completion order.
pub trait ProgressObserver: Sync {
    fn job_finished(&self, result: &JobResult, completed: usize, total: usize);
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn job_finished(&self, _result: &JobResult, _completed: usize, _total: usize) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(&JobResult, usize, usize) + Sync,
{
    fn job_finished(&self, result: &JobResult, completed: usize, total: usize) {
        self(result, completed, total)
    }
}
