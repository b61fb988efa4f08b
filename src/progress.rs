use indicatif::HumanBytes;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Receives a rendered status line whenever progress moves.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, status: &str);
}

/// Point-in-time view of a download's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub bytes_done: u64,
    pub bytes_total: u64,
    pub workers_total: usize,
    pub workers_remaining: usize,
}

/// Byte counter shared by every worker of one download.
///
/// `record` is the only mutation on the hot path and is a single atomic add,
/// so concurrent workers never lose updates. A worker's last `record`
/// happens-before its `worker_finished`, and `snapshot` reads the finished
/// count before the byte count, so a snapshot that shows a worker as done
/// also shows all of that worker's bytes.
pub struct ProgressTracker {
    bytes_done: AtomicU64,
    bytes_total: u64,
    workers_total: usize,
    workers_done: AtomicUsize,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl ProgressTracker {
    pub fn new(bytes_total: u64, workers_total: usize) -> Self {
        Self {
            bytes_done: AtomicU64::new(0),
            bytes_total,
            workers_total,
            workers_done: AtomicUsize::new(0),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Option<Arc<dyn ProgressObserver>>) -> Self {
        self.observer = observer;
        self
    }

    /// Adds `n` freshly persisted bytes and notifies the observer. Returns `n`.
    pub fn record(&self, n: u64) -> u64 {
        self.bytes_done.fetch_add(n, Ordering::AcqRel);
        self.notify();
        n
    }

    /// Marks one worker as completed, whether it succeeded or not.
    pub fn worker_finished(&self) {
        self.workers_done.fetch_add(1, Ordering::AcqRel);
        self.notify();
    }

    pub fn snapshot(&self) -> ProgressState {
        let done = self.workers_done.load(Ordering::Acquire);
        let bytes_done = self.bytes_done.load(Ordering::Acquire);
        ProgressState {
            bytes_done,
            bytes_total: self.bytes_total,
            workers_total: self.workers_total,
            workers_remaining: self.workers_total.saturating_sub(done),
        }
    }

    pub fn render(&self) -> String {
        let state = self.snapshot();
        format!(
            "Downloading {} / {} ({} of {} threads done)",
            HumanBytes(state.bytes_done),
            HumanBytes(state.bytes_total),
            state.workers_total - state.workers_remaining,
            state.workers_total
        )
    }

    fn notify(&self) {
        if let Some(observer) = &self.observer {
            observer.on_progress(&self.render());
        }
    }
}
